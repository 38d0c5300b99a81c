//! User agent generation

use rand::seq::SliceRandom;
use rand::Rng;

const CHROME_VERSIONS: &[&str] = &["122.0.0.0", "123.0.0.0", "124.0.0.0", "125.0.0.0", "126.0.0.0"];
const FIREFOX_VERSIONS: &[&str] = &["123.0", "124.0", "125.0", "126.0"];
const SAFARI_VERSIONS: &[&str] = &["17.3", "17.4", "17.5"];
const OS_STRINGS: &[&str] = &[
    "Windows NT 10.0; Win64; x64",
    "Macintosh; Intel Mac OS X 10_15_7",
    "X11; Linux x86_64",
    "X11; Ubuntu; Linux x86_64",
];

fn pick<'a, R: Rng>(rng: &mut R, options: &[&'a str]) -> &'a str {
    options.choose(rng).copied().unwrap_or_default()
}

/// Generate a random but realistic user agent string
pub fn generate_user_agent() -> String {
    let mut rng = rand::thread_rng();
    let os = pick(&mut rng, OS_STRINGS);

    match rng.gen_range(0..10) {
        // Chrome (60% chance)
        0..=5 => format!(
            "Mozilla/5.0 ({os}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{} Safari/537.36",
            pick(&mut rng, CHROME_VERSIONS)
        ),
        // Firefox (30% chance)
        6..=8 => {
            let firefox = pick(&mut rng, FIREFOX_VERSIONS);
            format!("Mozilla/5.0 ({os}; rv:{firefox}) Gecko/20100101 Firefox/{firefox}")
        }
        // Safari, only on Mac
        _ => format!(
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/{} Safari/605.1.15",
            pick(&mut rng, SAFARI_VERSIONS)
        ),
    }
}

/// Accept header for HTML pages
pub fn accept_html() -> &'static str {
    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"
}

/// Accept header for JSON APIs
pub fn accept_json() -> &'static str {
    "application/json,text/javascript,*/*;q=0.01"
}

/// Accept header for a request, by the `Accept` the provider already set
pub fn accept_for(explicit: Option<&str>, is_form_post: bool) -> &str {
    match explicit {
        Some(accept) => accept,
        None if is_form_post => accept_html(),
        None => accept_json(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_user_agent() {
        for _ in 0..20 {
            let ua = generate_user_agent();
            assert!(ua.starts_with("Mozilla/5.0"));
            assert!(ua.len() > 50);
        }
    }

    #[test]
    fn test_accept_header_choice() {
        assert_eq!(accept_for(Some("text/plain"), true), "text/plain");
        assert_eq!(accept_for(None, true), accept_html());
        assert_eq!(accept_for(None, false), accept_json());
    }
}
