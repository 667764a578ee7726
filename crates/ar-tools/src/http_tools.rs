//! Generic HTTP client plus the network-fetcher tools (spec.md §4.2, §5.2;
//! ground truth: `internal/tools/apiAdapter/send.go` and
//! `internal/tools/apis/{yahooFinance,googleRSS,searchWeb}/*.go`).

use std::collections::HashMap;
use std::time::Duration;

use regex::Regex;
use serde::Serialize;

use crate::error::ToolError;

fn json_value_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

const DESKTOP_UA: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

#[derive(Serialize)]
struct HttpResponseData {
    status_code: u16,
    headers: HashMap<String, String>,
    body: String,
}

/// `send_http_request{url,method,headers,body,content_type,timeout}`
/// (spec.md §4.2). Default timeout 30s, capped at 300s.
pub async fn send_http_request(
    client: &reqwest::Client,
    url: &str,
    method: &str,
    headers: &HashMap<String, String>,
    body: &HashMap<String, serde_json::Value>,
    content_type: &str,
    timeout: Option<u64>,
) -> Result<String, ToolError> {
    if url.is_empty() {
        return Err(ToolError::Message("url is required".into()));
    }
    let method = if method.is_empty() { "GET" } else { method }.to_uppercase();
    let method: reqwest::Method = method
        .parse()
        .map_err(|_| ToolError::Message(format!("invalid method: {method}")))?;

    let timeout = match timeout {
        Some(t) if t == 0 => 30,
        Some(t) if t > 300 => 300,
        Some(t) => t,
        None => 30,
    };

    let mut builder = client
        .request(method.clone(), url)
        .timeout(Duration::from_secs(timeout))
        .header("Accept", "application/json");

    if matches!(method, reqwest::Method::POST | reqwest::Method::PUT | reqwest::Method::PATCH) {
        if content_type == "form" {
            let form: Vec<(String, String)> = body
                .iter()
                .map(|(k, v)| (k.clone(), json_value_to_string(v)))
                .collect();
            builder = builder.form(&form);
        } else {
            builder = builder.json(body);
        }
    }

    for (k, v) in headers {
        builder = builder.header(k, v);
    }

    let resp = builder.send().await?;
    let status = resp.status().as_u16();
    let resp_headers: HashMap<String, String> = resp
        .headers()
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
        .collect();
    let body = resp.text().await?;

    let data = HttpResponseData { status_code: status, headers: resp_headers, body };
    Ok(serde_json::to_string_pretty(&data)?)
}

const YAHOO_HOSTS: &[&str] = &[
    "https://query1.finance.yahoo.com/v8/finance/chart",
    "https://query2.finance.yahoo.com/v8/finance/chart",
];
const YAHOO_INTERVALS: &[&str] = &[
    "1m", "2m", "5m", "15m", "30m", "60m", "90m", "1h", "1d", "5d", "1wk", "1mo", "3mo",
];
const YAHOO_RANGES: &[&str] = &["1d", "5d", "1mo", "3mo", "6mo", "1y", "2y", "5y", "10y", "ytd", "max"];

/// Query both Yahoo Finance mirror hosts concurrently; the first successful
/// response wins (spec.md §5 "Yahoo Finance dual-host fetch").
pub async fn fetch_yahoo_finance(
    client: &reqwest::Client,
    ticker: &str,
    bar_interval: &str,
    time_range: &str,
) -> Result<String, ToolError> {
    let ticker = ticker.trim().to_uppercase();
    if ticker.is_empty() {
        return Err(ToolError::Message("ticker is required".into()));
    }
    let bar_interval = if bar_interval.is_empty() { "1m" } else { bar_interval };
    let time_range = if time_range.is_empty() { "1d" } else { time_range };
    if !YAHOO_INTERVALS.contains(&bar_interval) {
        return Err(ToolError::Message(format!("invalid interval: {bar_interval}")));
    }
    if !YAHOO_RANGES.contains(&time_range) {
        return Err(ToolError::Message(format!("invalid range: {time_range}")));
    }

    // Concurrent fetch of both mirror hosts; first success wins (spec.md
    // §5 "Yahoo Finance dual-host fetch"), mirroring the source's
    // unbuffered-channel race over exactly two goroutines.
    let (tx, mut rx) = tokio::sync::mpsc::channel(2);
    for host in YAHOO_HOSTS {
        let url = format!("{host}/{ticker}?interval={bar_interval}&range={time_range}");
        let client = client.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(fetch_yahoo_host(&client, &url).await).await;
        });
    }
    drop(tx);

    let mut last_err = None;
    for _ in 0..2 {
        match rx.recv().await {
            Some(Ok(body)) => return Ok(body),
            Some(Err(e)) => last_err = Some(e),
            None => break,
        }
    }
    Err(last_err.unwrap_or_else(|| ToolError::Message(format!("failed to fetch ticker ({ticker})"))))
}

async fn fetch_yahoo_host(client: &reqwest::Client, url: &str) -> Result<String, ToolError> {
    let resp = client
        .get(url)
        .timeout(Duration::from_secs(10))
        .header("User-Agent", DESKTOP_UA)
        .header("Accept", "application/json")
        .header("Accept-Language", "en-US,en;q=0.9")
        .header("Referer", "https://finance.yahoo.com")
        .send()
        .await?;
    if !resp.status().is_success() {
        return Err(ToolError::Message(format!("failed to fetch: {}", resp.status())));
    }
    let body = resp.text().await?;
    Ok(body)
}

const RSS_TIME_RANGES: &[&str] = &["1h", "3h", "6h", "12h", "24h", "7d"];

/// `fetch_google_rss{keyword,time_range,language}` (ground truth:
/// `internal/tools/apis/googleRSS/fetch.go`). `language` is `geo:lang`
/// (e.g. `TW:zh-Hant`), default `TW:zh-Hant`.
pub async fn fetch_google_rss(
    client: &reqwest::Client,
    keyword: &str,
    time_range: &str,
    language: &str,
) -> Result<String, ToolError> {
    if keyword.is_empty() {
        return Err(ToolError::Message("keyword is required".into()));
    }
    let time_range = if time_range.is_empty() { "7d" } else { time_range };
    let language = if language.is_empty() { "TW:zh-Hant" } else { language };
    if !RSS_TIME_RANGES.contains(&time_range) {
        return Err(ToolError::Message(format!("invalid interval: {time_range}")));
    }
    let Some((geo, lang)) = language.split_once(':') else {
        return Err(ToolError::Message(format!("invalid lang format: {language}")));
    };

    let q = format!("{keyword} when:{time_range}");
    let url = format!(
        "https://news.google.com/rss/search?q={}&hl={}&gl={}&ceid={}",
        urlencoding::encode(&q),
        urlencoding::encode(lang),
        urlencoding::encode(geo),
        urlencoding::encode(language),
    );

    let resp = client
        .get(&url)
        .timeout(Duration::from_secs(10))
        .header("User-Agent", DESKTOP_UA)
        .send()
        .await?;
    if !resp.status().is_success() {
        return Err(ToolError::Message(format!("failed to fetch: {}", resp.status())));
    }
    let body = resp.text().await?;
    parse_rss(&body)
}

fn parse_rss(body: &str) -> Result<String, ToolError> {
    let item_re = Regex::new(r"(?s)<item>(.*?)</item>").unwrap();
    let title_re = Regex::new(r"(?s)<title>(.*?)</title>").unwrap();
    let link_re = Regex::new(r"(?s)<link>(.*?)</link>").unwrap();
    let pubdate_re = Regex::new(r"(?s)<pubDate>(.*?)</pubDate>").unwrap();
    let source_re = Regex::new(r#"(?s)<source url="([^"]*)">(.*?)</source>"#).unwrap();

    let mut seen = std::collections::HashSet::new();
    let mut out = String::new();
    let mut n = 0;
    for caps in item_re.captures_iter(body) {
        let block = &caps[1];
        let title = title_re.captures(block).map(|c| c[1].trim().to_string()).unwrap_or_default();
        let link = link_re.captures(block).map(|c| c[1].trim().to_string()).unwrap_or_default();
        let pub_date = pubdate_re.captures(block).map(|c| c[1].trim().to_string()).unwrap_or_default();
        let (source_url, source_name) = source_re
            .captures(block)
            .map(|c| (c[1].to_string(), c[2].trim().to_string()))
            .unwrap_or_default();

        let key = format!("{title}{source_name}");
        if !seen.insert(key) {
            continue;
        }

        n += 1;
        out.push_str(&format!("{n}. {title}\n"));
        if !source_url.is_empty() {
            out.push_str(&format!("   來源網站: {source_url} ({source_name})\n"));
        } else if !source_name.is_empty() {
            out.push_str(&format!("   來源: {source_name}\n"));
        }
        if !pub_date.is_empty() {
            out.push_str(&format!("   發布時間: {pub_date}\n"));
        }
        out.push_str(&format!("   Google News: {link}\n\n"));
    }

    if n == 0 {
        return Err(ToolError::Message("no result".into()));
    }
    Ok(out)
}

/// `fetch_weather{location}` — no Go ground truth was retrieved for this
/// fetcher (see DESIGN.md); modeled on the same single-endpoint,
/// no-API-key-required shape as `fetch_google_rss`, against Open-Meteo's
/// free geocoding + forecast APIs.
pub async fn fetch_weather(client: &reqwest::Client, location: &str) -> Result<String, ToolError> {
    if location.trim().is_empty() {
        return Err(ToolError::Message("location is required".into()));
    }

    #[derive(serde::Deserialize)]
    struct GeoResult {
        name: String,
        latitude: f64,
        longitude: f64,
    }
    #[derive(serde::Deserialize)]
    struct GeoResponse {
        results: Option<Vec<GeoResult>>,
    }

    let geo_url = format!(
        "https://geocoding-api.open-meteo.com/v1/search?name={}&count=1",
        urlencoding::encode(location)
    );
    let geo: GeoResponse = client
        .get(&geo_url)
        .timeout(Duration::from_secs(10))
        .send()
        .await?
        .json()
        .await?;
    let Some(hit) = geo.results.and_then(|r| r.into_iter().next()) else {
        return Err(ToolError::Message(format!("location not found: {location}")));
    };

    #[derive(serde::Deserialize)]
    struct CurrentWeather {
        temperature: f64,
        windspeed: f64,
        weathercode: i64,
    }
    #[derive(serde::Deserialize)]
    struct ForecastResponse {
        current_weather: CurrentWeather,
    }

    let forecast_url = format!(
        "https://api.open-meteo.com/v1/forecast?latitude={}&longitude={}&current_weather=true",
        hit.latitude, hit.longitude
    );
    let forecast: ForecastResponse = client
        .get(&forecast_url)
        .timeout(Duration::from_secs(10))
        .send()
        .await?
        .json()
        .await?;

    let cw = forecast.current_weather;
    Ok(format!(
        "Location:    {}\nTemperature: {:.1}\u{b0}C\nWind speed:  {:.1} km/h\nCondition code: {}\n",
        hit.name, cw.temperature, cw.windspeed, cw.weathercode
    ))
}

/// `search_web{query,time_range}` over DuckDuckGo's HTML endpoint (ground
/// truth: `internal/tools/apis/searchWeb/{SearchWeb,fetchDDG}.go`).
pub async fn search_web(client: &reqwest::Client, query: &str, time_range: &str) -> Result<String, ToolError> {
    if query.trim().is_empty() {
        return Err(ToolError::Message("query is empty".into()));
    }
    const VALID: &[&str] = &["1h", "3h", "6h", "12h", "1d", "7d", "1m", "1y"];
    if !time_range.is_empty() && !VALID.contains(&time_range) {
        return Err(ToolError::Message(format!(
            "invalid time range {time_range:?}: must be one of 1h, 3h, 6h, 12h, 1d, 7d, 1m, 1y"
        )));
    }

    let mut form: Vec<(&str, &str)> = vec![("q", query), ("kl", "tw-tzh"), ("kp", "-2"), ("k1", "-1")];
    let df = match time_range {
        "1h" | "3h" | "6h" | "12h" | "1d" => "d",
        "7d" => "w",
        "1m" => "m",
        "1y" => "y",
        _ => "",
    };
    if !df.is_empty() {
        form.push(("df", df));
    }

    let resp = client
        .post("https://html.duckduckgo.com/html/")
        .timeout(Duration::from_secs(5))
        .header("User-Agent", "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36")
        .header("Accept-Language", "zh-TW,zh;q=0.9,en-US;q=0.8,en;q=0.7")
        .form(&form)
        .send()
        .await?;
    if !resp.status().is_success() {
        return Err(ToolError::Message(format!("failed to fetch: {}", resp.status())));
    }
    let html = resp.text().await?;
    let results = parse_ddg_results(&html);
    if results.is_empty() {
        return Err(ToolError::Message(format!("parse: {query}")));
    }
    Ok(serde_json::to_string(&results)?)
}

#[derive(Serialize)]
struct WebResult {
    position: usize,
    title: String,
    url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    description: String,
}

fn parse_ddg_results(html: &str) -> Vec<WebResult> {
    let link_re = Regex::new(
        r#"(?s)<div[^>]+class="[^"]*result[^"]*results_links[^"]*"[^>]*>(.*?)</div>\s*</div>\s*</div>"#,
    )
    .unwrap();
    let a_re = Regex::new(r#"(?is)<a[^>]+class="[^"]*result__a[^"]*"[^>]*href="([^"]*)"[^>]*>(.*?)</a>"#).unwrap();
    let snippet_re = Regex::new(r#"(?is)<a[^>]+class="[^"]*result__snippet[^"]*"[^>]*>(.*?)</a>"#).unwrap();
    let tag_re = Regex::new(r"<[^>]+>").unwrap();

    let mut results = Vec::new();
    for block in link_re.find_iter(html) {
        if results.len() >= 10 {
            break;
        }
        let block = block.as_str();
        let Some(a) = a_re.captures(block) else { continue };
        let title = extract_text(&tag_re, &a[2]);
        if title.is_empty() {
            continue;
        }
        let url = extract_ddg_url(&a[1]);
        if url.is_empty() {
            continue;
        }
        let description = snippet_re
            .captures(block)
            .map(|c| extract_text(&tag_re, &c[1]))
            .unwrap_or_default();

        results.push(WebResult { position: results.len() + 1, title, url, description });
    }
    results
}

fn extract_ddg_url(text: &str) -> String {
    if text.starts_with("http") && !text.contains("duckduckgo.com") {
        return text.to_string();
    }
    let Ok(parsed) = reqwest::Url::parse(text)
        .or_else(|_| reqwest::Url::parse(&format!("https://duckduckgo.com{text}")))
    else {
        return String::new();
    };
    parsed
        .query_pairs()
        .find(|(k, _)| k == "uddg")
        .map(|(_, v)| v.into_owned())
        .unwrap_or_default()
}

fn extract_text(tag_re: &Regex, text: &str) -> String {
    let stripped = tag_re.replace_all(text, "");
    let mut s = stripped.into_owned();
    for (entity, ch) in [
        ("&amp;", "&"),
        ("&lt;", "<"),
        ("&gt;", ">"),
        ("&quot;", "\""),
        ("&#39;", "'"),
        ("&nbsp;", " "),
    ] {
        s = s.replace(entity, ch);
    }
    s.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rss_items_and_dedupes() {
        let xml = r#"<rss><channel>
            <item><title>A</title><link>http://x/1</link><pubDate>d1</pubDate><source url="http://s">S</source></item>
            <item><title>A</title><link>http://x/1</link><pubDate>d1</pubDate><source url="http://s">S</source></item>
            <item><title>B</title><link>http://x/2</link><pubDate>d2</pubDate><source url="http://s2">S2</source></item>
        </channel></rss>"#;
        let out = parse_rss(xml).unwrap();
        assert_eq!(out.matches("Google News:").count(), 2);
    }

    #[test]
    fn empty_rss_is_an_error() {
        assert!(parse_rss("<rss><channel></channel></rss>").is_err());
    }

    #[test]
    fn extract_ddg_url_decodes_uddg_redirect() {
        let redirect = "/l/?uddg=https%3A%2F%2Fexample.com%2Fpage";
        assert_eq!(extract_ddg_url(redirect), "https://example.com/page");
    }

    #[test]
    fn extract_ddg_url_passes_through_direct_links() {
        assert_eq!(extract_ddg_url("https://example.com"), "https://example.com");
    }
}
