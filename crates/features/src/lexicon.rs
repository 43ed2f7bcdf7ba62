//! Static lookup tables for stores, categories and audiences.
//!
//! Every lookup is total: an unknown key degrades to an identity or
//! singleton answer instead of failing.

/// Store name to the aliases a user may type for it.
pub const STORE_ALIASES: &[(&str, &[&str])] = &[
    ("7-11", &["7-11", "7eleven", "711", "超商", "便利商店", "便利店"]),
    ("家樂福", &["家樂福", "carrefour", "量販", "量販店", "大賣場"]),
    ("momo", &["momo", "momo購物", "富邦momo", "網購", "電商"]),
    ("PChome", &["pchome", "pc home", "網購", "電商", "線上購物"]),
    ("全聯", &["全聯", "pxmart", "超市"]),
    ("好市多", &["好市多", "costco", "量販", "會員制量販"]),
];

/// Spending category to the keywords that signal it.
pub const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    ("supermarket", &["超市", "量販", "全聯", "家樂福", "好市多", "大潤發"]),
    ("convenience", &["超商", "便利商店", "7-11", "全家", "OK", "萊爾富"]),
    ("online", &["網購", "線上", "電商", "momo", "pchome", "蝦皮"]),
    ("dining", &["餐廳", "美食", "用餐", "吃飯", "麥當勞", "肯德基"]),
    ("overseas", &["海外", "國外", "出國", "旅遊", "國際"]),
    ("gas", &["加油", "中油", "台塑", "全國加油站"]),
    ("transport", &["交通", "uber", "計程車", "捷運", "高鐵"]),
];

/// Audience tag to the keywords that signal it.
pub const AUDIENCE_KEYWORDS: &[(&str, &[&str])] = &[
    ("學生", &["學生", "學生族", "新鮮人"]),
    ("小資族", &["小資", "省錢", "節省"]),
    ("數位原生", &["數位", "網路", "線上", "科技"]),
    ("旅遊族", &["旅遊", "出國", "海外", "國外"]),
    ("高收入族群", &["高收入", "商務", "白金", "頂級"]),
    ("年輕族群", &["年輕", "青年", "學生"]),
];

/// Tokens that mean the user cares about cashback.
pub const CASHBACK_TOKENS: &[&str] = &["高回饋", "回饋", "%"];

/// Tokens that ask for a card without annual fee.
pub const FEE_FREE_TOKENS: &[&str] = &["免年費", "無年費", "不收年費"];

pub const FEE_TOKEN: &str = "年費";

/// Short category names, matched against the message.
const DISPLAY_NAMES: &[(&str, &str)] = &[
    ("overseas", "海外"),
    ("dining", "餐廳"),
    ("supermarket", "超市"),
    ("online", "網購"),
    ("digital", "數位"),
    ("all", "所有"),
    ("mobile", "行動支付"),
    ("streaming", "串流"),
    ("gas", "加油"),
    ("transport", "交通"),
];

/// Long category labels for rate tables.
const RATE_LABELS: &[(&str, &str)] = &[
    ("overseas", "海外消費"),
    ("dining", "餐廳用餐"),
    ("supermarket", "超市購物"),
    ("online", "網路購物"),
    ("digital", "數位通路"),
    ("all", "所有消費"),
    ("mobile", "行動支付"),
    ("streaming", "串流平台"),
    ("gas", "加油站"),
    ("transport", "交通運輸"),
    ("general", "一般消費"),
];

fn lookup<'a, T: ?Sized>(table: &'a [(&str, &'a T)], key: &str) -> Option<&'a T> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// Lowercased aliases for a store; unknown stores alias only themselves.
pub fn store_aliases(store: &str) -> Vec<String> {
    match lookup(STORE_ALIASES, store) {
        Some(aliases) => aliases.iter().map(|a| a.to_lowercase()).collect(),
        None => vec![store.to_lowercase()],
    }
}

/// Keywords for a spending category; unknown categories have none.
pub fn category_keywords(category: &str) -> &'static [&'static str] {
    lookup(CATEGORY_KEYWORDS, category).unwrap_or(&[])
}

/// Keywords for an audience tag; unknown tags match only themselves.
pub fn audience_keywords(tag: &str) -> Vec<String> {
    match lookup(AUDIENCE_KEYWORDS, tag) {
        Some(keywords) => keywords.iter().map(|k| k.to_lowercase()).collect(),
        None => vec![tag.to_lowercase()],
    }
}

/// Short display name for a category code, the code itself when unmapped.
pub fn category_display_name(category: &str) -> &str {
    lookup(DISPLAY_NAMES, category).unwrap_or(category)
}

/// Long rate-table label for a category code, the code itself when unmapped.
pub fn category_rate_label(category: &str) -> &str {
    lookup(RATE_LABELS, category).unwrap_or(category)
}

/// Card cashback field read for a lexicon category.
///
/// `convenience` reads the supermarket rate; `online` falls back to `digital`.
pub fn category_field_rate(card: &cardmatch_model::CardRecord, category: &str) -> f64 {
    let field = |name: &str| card.cashback_rates.get(name).copied().filter(|r| *r != 0.0);
    let rate = match category {
        "supermarket" | "convenience" => field("supermarket"),
        "online" => field("online").or_else(|| field("digital")),
        "dining" | "overseas" | "gas" | "transport" => field(category),
        _ => None,
    };
    rate.unwrap_or(0.0)
}
