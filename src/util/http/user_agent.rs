use rand::RngExt;

const CHROME_VERSIONS: [&str; 8] = [
    "133.0.6943.88",
    "132.0.6834.110",
    "131.0.6778.108",
    "130.0.6723.117",
    "129.0.6668.89",
    "128.0.6613.138",
    "127.0.6533.119",
    "126.0.6478.182",
];

const FIREFOX_VERSIONS: [&str; 6] = ["133.0", "132.0", "131.0", "130.0", "129.0", "128.0"];

const OS_STRINGS: [&str; 8] = [
    "Windows NT 10.0; Win64; x64",
    "Windows NT 10.0; Win64; x64",
    "Macintosh; Intel Mac OS X 10_15_7",
    "Macintosh; Intel Mac OS X 14_7_1",
    "X11; Linux x86_64",
    "X11; Ubuntu; Linux x86_64",
    "Macintosh; Intel Mac OS X 15_1",
    "Windows NT 10.0",
];

fn gen_chrome_ua() -> String {
    let mut rng = rand::rng();
    let version = CHROME_VERSIONS[rng.random_range(0..CHROME_VERSIONS.len())];
    let os = OS_STRINGS[rng.random_range(0..OS_STRINGS.len())];

    format!(
        "Mozilla/5.0 ({}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{} Safari/537.36",
        os, version
    )
}

fn gen_firefox_ua() -> String {
    let mut rng = rand::rng();
    let version = FIREFOX_VERSIONS[rng.random_range(0..FIREFOX_VERSIONS.len())];
    let os = OS_STRINGS[rng.random_range(0..OS_STRINGS.len())];

    format!(
        "Mozilla/5.0 ({}; rv:{}) Gecko/20100101 Firefox/{}",
        os, version, version
    )
}

/// 產生一個擬真的瀏覽器 User-Agent，避免被目標網站以固定 UA 封鎖。
pub fn gen_random_ua() -> String {
    let mut rng = rand::rng();
    if rng.random_range(0..10) < 7 {
        gen_chrome_ua()
    } else {
        gen_firefox_ua()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ua_format() {
        for _ in 0..50 {
            let ua = gen_random_ua();
            assert!(ua.starts_with("Mozilla/5.0"), "unexpected UA: {}", ua);
            assert!(ua.len() > 40, "UA too short: {}", ua);
        }
    }
}
