// src/summarize/prompt.rs
//! Prompt builders. Pure functions of (industry, items, today).

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use crate::ingest::types::NewsItem;

pub const DEFAULT_DIGEST_LIMIT: usize = 40;
pub const KEYWORD_LABEL: &str = "키워드:";
pub const SOURCE_LABEL: &str = "출처:";

/// Reports are dated in Korean local time (UTC+9, no DST).
pub fn seoul_today(now: DateTime<Utc>) -> NaiveDate {
    (now + chrono::Duration::hours(9)).date_naive()
}

/// `2025. 03. 04.`
pub fn structured_date(d: NaiveDate) -> String {
    d.format("%Y. %m. %d.").to_string()
}

/// `2025-03-04`
pub fn report_date(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

/// Enumerated digest of the first `limit` items: `[idx] title (source, publishedAt)`.
pub fn news_digest(items: &[NewsItem], limit: usize) -> String {
    items
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, it)| {
            format!(
                "[{}] {} ({}, {})",
                i + 1,
                it.title,
                it.source,
                it.published_at.to_rfc3339_opts(SecondsFormat::Millis, true)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn structured_prompt(industry: &str, items: &[NewsItem], today: &str, limit: usize) -> String {
    let digest = news_digest(items, limit);
    format!(
        r##"당신은 시니어 산업 분석가임. 아래 뉴스 목록만을 근거로 '{industry}' 산업의 주요 트렌드를 서로 다른 3가지 테마로 정리한 보고서를 작성할 것.

[데이터]
{digest}

[작성 지침]
1. 테마는 정확히 3개이며 서로 겹치지 않아야 함.
2. 건조한 보고서 메모체(~함, ~필요, ~가능성 높음)만 사용함.
3. 1인칭 표현을 쓰지 않음.
4. 감성적이거나 과장된 표현을 배제함.
5. 키워드는 '#'으로 시작하는 짧은 태그로 1~5개 작성함.
6. 아래 JSON 형식을 그대로 따를 것.

[출력 형식]
{{
  "trends": [
    {{
      "date": "{today}",
      "title": "요약 제목",
      "content": "데이터에 근거한 구체적인 트렌드 분석",
      "keywords": ["#키워드1", "#키워드2", "#키워드3"]
    }}
  ]
}}

유효한 JSON만 출력하고 다른 텍스트는 포함하지 말 것."##
    )
}

pub fn report_prompt(industry: &str, today: &str) -> String {
    format!(
        r##"You are a professional market trend analyst.
Search the web for the most impactful news about the "{industry}" industry published strictly within the last 7 days.
Prefer Korean-language sources.
Pick exactly 3 of the most significant topics.

Current Date: {today}

Output rules:
1. Plain text only. No Markdown (no **bold**, no ## headers).
2. Dry, objective, concise Korean report style.
3. End sentences with dry nominal endings such as "~함", "~음", "~것으로 나타남", "~예정됨".
4. Never use polite conversational endings such as "~해요", "~입니다".
5. Each topic is exactly 2-3 sentences.
6. Do not write any {SOURCE_LABEL} lines; verified sources are attached afterwards.
7. Use exactly this layout:

날짜: {today}
제목: [{industry}] 주간 트렌드 리포트

1. <Title of Trend 1>
<Fact-based sentence 1>
<Fact-based sentence 2>
<Fact-based sentence 3 (optional)>
{KEYWORD_LABEL} #<Keyword1> #<Keyword2> ...

2. <Title of Trend 2>
<Summary sentences...>
{KEYWORD_LABEL} #<Keyword1> ...

3. <Title of Trend 3>
<Summary sentences...>
{KEYWORD_LABEL} #<Keyword1> ...

Generate the report now."##
    )
}
