/// Coarse classification of a `User-Agent` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAgentInfo {
    pub os: String,
    pub browser: String,
    pub platform: String,
}

const UNKNOWN: &str = "unknown";

// Order matters: the first matching signature wins, so more specific tokens
// come before the generic ones they contain ("edg/" before "chrome/",
// "android" before "linux", "iphone" before "mac os x").
const OS_SIGNATURES: [(&str, &str); 10] = [
    ("windows nt 10.0", "Windows 10"),
    ("windows nt 6.3", "Windows 8.1"),
    ("windows nt 6.1", "Windows 7"),
    ("windows", "Windows"),
    ("android", "Android"),
    ("iphone", "iOS"),
    ("ipad", "iOS"),
    ("cros", "Chrome OS"),
    ("mac os x", "OS X"),
    ("linux", "Linux"),
];

const BROWSER_SIGNATURES: [(&str, &str); 9] = [
    ("edg/", "Edge"),
    ("opr/", "Opera"),
    ("samsungbrowser", "Samsung Internet"),
    ("firefox/", "Firefox"),
    ("fxios/", "Firefox"),
    ("crios/", "Chrome"),
    ("chrome/", "Chrome"),
    ("safari/", "Safari"),
    ("curl/", "curl"),
];

const PLATFORM_SIGNATURES: [(&str, &str); 7] = [
    ("windows", "Microsoft Windows"),
    ("android", "Android"),
    ("iphone", "iPhone"),
    ("ipad", "iPad"),
    ("macintosh", "Apple Mac"),
    ("cros", "Chromebook"),
    ("linux", "Linux"),
];

fn first_match(ua_lower: &str, signatures: &[(&str, &str)]) -> String {
    signatures
        .iter()
        .find(|(sig, _)| ua_lower.contains(sig))
        .map_or(UNKNOWN, |(_, label)| label)
        .to_string()
}

pub fn classify(user_agent: &str) -> UserAgentInfo {
    let ua_lower = user_agent.to_ascii_lowercase();
    UserAgentInfo {
        os: first_match(&ua_lower, &OS_SIGNATURES),
        browser: first_match(&ua_lower, &BROWSER_SIGNATURES),
        platform: first_match(&ua_lower, &PLATFORM_SIGNATURES),
    }
}
