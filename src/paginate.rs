use anyhow::Context as _;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://www.nomor.net/_kodepos.php";
pub const DEFAULT_TOTAL_RECORDS: usize = 83_763;
pub const DEFAULT_PAGE_SIZE: usize = 1_000;
pub const DEFAULT_DELAY_SECS: u64 = 10;
/// Upper bound on one crawl; the whole plan is built before the first fetch.
pub const MAX_PAGES: usize = 1_000_000;

/// Offset window the listing expects on every page after the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub start: usize,
    pub end: usize,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub number: usize,
    pub window: Option<PageWindow>,
    pub url: Url,
}

pub fn page_count(total: usize, page_size: usize) -> anyhow::Result<usize> {
    if page_size == 0 {
        anyhow::bail!("page size must be greater than zero");
    }
    Ok(total.div_ceil(page_size))
}

/// Windows for pages 2..=pages. The window trails the page index by one page,
/// which is how the listing addresses its offsets.
pub fn page_windows(pages: usize, page_size: usize) -> anyhow::Result<Vec<PageWindow>> {
    let mut windows = Vec::new();
    for index in 2..=pages {
        let end = (index - 1)
            .checked_mul(page_size)
            .ok_or_else(|| anyhow::anyhow!("offset window for page {index} overflows"))?;
        windows.push(PageWindow {
            start: end - page_size + 1,
            end,
            index,
        });
    }
    Ok(windows)
}

pub fn plan_pages(base_url: &str, total: usize, page_size: usize) -> anyhow::Result<Vec<PageRequest>> {
    let base = Url::parse(base_url).with_context(|| format!("parse base url: {base_url}"))?;
    if base.scheme() != "http" && base.scheme() != "https" {
        anyhow::bail!("base url must be http/https: {base}");
    }

    let pages = page_count(total, page_size)?;
    if pages == 0 {
        return Ok(Vec::new());
    }
    if pages > MAX_PAGES {
        anyhow::bail!(
            "{pages} pages exceeds the limit of {MAX_PAGES}; raise --per-page or lower --total"
        );
    }

    let mut requests = Vec::with_capacity(pages);
    requests.push(PageRequest {
        number: 1,
        window: None,
        url: first_page_url(&base, page_size),
    });
    for window in page_windows(pages, page_size)? {
        requests.push(PageRequest {
            number: window.index,
            window: Some(window),
            url: offset_page_url(&base, page_size, window),
        });
    }

    Ok(requests)
}

fn first_page_url(base: &Url, page_size: usize) -> Url {
    let mut url = base.clone();
    url.query_pairs_mut()
        .clear()
        .append_pair("_i", "desa-kodepos")
        .append_pair("daerah", "")
        .append_pair("jobs", "")
        .append_pair("perhal", &page_size.to_string())
        .append_pair("sby", "010000")
        .append_pair("asc", "0001010")
        .append_pair("urut", "8");
    url
}

fn offset_page_url(base: &Url, page_size: usize, window: PageWindow) -> Url {
    let mut url = base.clone();
    url.query_pairs_mut()
        .clear()
        .append_pair("_i", "desa-kodepos")
        .append_pair("daerah", "")
        .append_pair("jobs", "")
        .append_pair("perhal", &page_size.to_string())
        .append_pair("urut", "8")
        .append_pair("asc", "0001010")
        .append_pair("sby", "010000")
        .append_pair("no1", &window.start.to_string())
        .append_pair("no2", &window.end.to_string())
        .append_pair("kk", &window.index.to_string());
    url
}
