//! Starter configuration: Chinese tech news portals and two reports.

use crate::types::{ReportConfig, SourceConfig, TimeRange};

const HOURLY: i64 = 3600;

/// The shipped crawl sources, in seeding order.
pub fn default_sources() -> Vec<SourceConfig> {
    [
        (
            "科技",
            "https://www.news.cn/comments/wpyc/index.html",
            r"(https://www\.news\.cn/comments/\d{8}/[a-f0-9]{32}/c\.html)",
        ),
        (
            "虎嗅",
            "https://m.huxiu.com/channel/105.html",
            r"(https://www\.huxiu\.com/article/\d+\.html)",
        ),
        (
            "36 氪 - AI",
            "https://36kr.com/information/AI/",
            r"(https://36kr\.com/p/\d+)",
        ),
        (
            "36 氪 - 职场",
            "https://36kr.com/information/web_zhichang/",
            r"(https://36kr\.com/p/\d+)",
        ),
        (
            "36 氪 - 其他",
            "https://36kr.com/information/other/",
            r"(https://36kr\.com/p/\d+|https://36kr\.com/topics/\d+|https://36kr\.com/academe/\d+|https://36kr\.com/information/\d+/)",
        ),
        (
            "新华网 - 数字经济",
            "https://www.news.cn/tech/szjj/index.html",
            r"(https://www\.news\.cn/\w+/\d{8}/[a-f0-9]{32}/c\.html)",
        ),
        (
            "新华网 - 科技快讯",
            "https://www.news.cn/tech/kjkx/index.html",
            r"(https://www\.news\.cn/\w+/\d{8}/[a-f0-9]{32}/c\.html)",
        ),
    ]
    .into_iter()
    .map(|(name, listing, pattern)| SourceConfig::new(name, listing, pattern).with_frequency(HOURLY))
    .collect()
}

/// Starter reports wired to `sources` by name. Missing sources are skipped.
pub fn default_reports(sources: &[SourceConfig]) -> Vec<ReportConfig> {
    let ids = |names: &[&str]| {
        names
            .iter()
            .filter_map(|name| sources.iter().find(|s| s.name == *name).map(|s| s.id))
            .collect::<Vec<_>>()
    };

    vec![
        ReportConfig::new("科技新闻日报", "汇总每日科技新闻，关注人工智能和技术创新动态")
            .with_sources(ids(&["科技", "虎嗅", "36 氪 - AI", "新华网 - 数字经济", "新华网 - 科技快讯"]))
            .with_keywords("人工智能,AI,科技,技术,创新")
            .with_time_range(TimeRange::Day),
        ReportConfig::new("AI 深度研究周报", "深度分析AI行业发展趋势和技术进展")
            .with_sources(ids(&["36 氪 - AI"]))
            .with_keywords("人工智能,AI,大模型,机器学习,深度学习")
            .with_time_range(TimeRange::Week)
            .with_deep_research(true)
            .inactive(),
    ]
}
