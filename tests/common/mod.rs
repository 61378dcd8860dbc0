//! Common test utilities

use std::path::Path;

use ev_scraper::config::Config;

/// Configuration pointing every collaborator at `base_url`, with pacing off
/// and output under `dir`
pub fn test_config(base_url: &str, dir: &Path) -> Config {
    let mut config = Config::default();
    config.crawler.base_url = base_url.to_string();
    config.crawler.page_delay_ms = 0;
    config.crawler.detail_delay_ms = 0;
    config.crawler.retry_delay_ms = 1;
    config.crawler.request_timeout_secs = 5;
    config.geocoding.endpoint = format!("{base_url}/search");
    config.geocoding.delay_ms = 0;
    config.output.dir = dir.join("DB");
    config.output.dashboard_json = dir.join("dashboard").join("data.json");
    config
}

/// Wrap body markup in a page, optionally with a "next page" control
pub fn page(body: &str, has_next: bool) -> String {
    let nav = if has_next {
        r#"<nav aria-label="Pagination Navigation"><button aria-label="Go to page 2">2</button></nav>"#
    } else {
        ""
    };
    format!("<!DOCTYPE html><html><head><meta charset=\"utf-8\"></head><body><main>{body}{nav}</main></body></html>")
}

/// One review card
pub fn review_card(name: &str, address: &str, body: &str) -> String {
    format!(
        r#"<div class="bg-white border rounded p-3">
             <h3>{name} / 日産自動車</h3>
             <p class="text-sm text-gray-500">{address}</p>
             <hr>
             <div><p>{body}</p></div>
             <p class="text-xs"><span class="mr-4">投稿日時</span>2026年2月7日（土） 18時</p>
             <a class="u-id" href="/user/1">EVuser</a>
           </div>"#
    )
}

/// One fault/maintenance listing card
#[allow(dead_code)]
pub fn listing_card(name: &str, href: &str, address: &str, detail: &str) -> String {
    format!(
        r#"<div class="bg-white p-2 md:p-3 border mt-3">
             <a class="font-bold text-lg" href="{href}">{name}</a>
             <p class="text-sm mt-1 text-gray-600">{address}</p>
             <h5 class="font-bold">故障内容</h5>
             <p>{detail}</p>
             <div class="bg-base_color border rounded">
               <div class="grid grid-cols-2">
                 <div><p>報告者</p></div>
                 <div><p>2026/02/07 18:00</p></div>
               </div>
             </div>
           </div>"#
    )
}

/// One usage card with its table
#[allow(dead_code)]
pub fn usage_card(name: &str, address: &str, used_at: &str) -> String {
    format!(
        r#"<div class="bg-white border p-3">
             <a href="/detail/77">{name}</a>
             <p class="text-sm">{address}</p>
             <table>
               <tr><th>利用日時</th><td>{used_at}</td></tr>
               <tr><th>充電タイプ</th><td>急速</td></tr>
               <tr><th>充電結果</th><td>充電できた</td></tr>
               <tr><th>車種</th><td>リーフ</td></tr>
             </table>
           </div>"#
    )
}
