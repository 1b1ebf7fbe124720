//! Integration tests for the rate limiting core behind the public API.

use std::sync::Arc;
use std::time::Duration;

use tollgate::clock::{Clock, ManualClock};
use tollgate::config::TollgateConfig;
use tollgate::ratelimit::{Policy, RateKey, RateLimiter, Reaper, Window, WindowStore};

fn key(client: &str, route: &str) -> RateKey {
    RateKey::derive([client], None, route)
}

#[test]
fn default_configuration_enforces_the_endpoint_policies() {
    let config = TollgateConfig::default();
    let contact = config.rate_limiting.contact.to_policy().unwrap();
    let subscribe = config.rate_limiting.subscribe.to_policy().unwrap();
    let limiter = RateLimiter::new();

    for _ in 0..5 {
        let verdict = limiter.decide(key("203.0.113.5", "/api/contact"), &contact);
        assert!(verdict.is_allowed());
    }
    let verdict = limiter.decide(key("203.0.113.5", "/api/contact"), &contact);
    assert!(!verdict.is_allowed());

    // The same client's subscribe quota is tracked separately and is
    // twice as generous.
    for _ in 0..10 {
        let verdict = limiter.decide(key("203.0.113.5", "/api/subscribe"), &subscribe);
        assert!(verdict.is_allowed());
    }
    let verdict = limiter.decide(key("203.0.113.5", "/api/subscribe"), &subscribe);
    assert!(!verdict.is_allowed());
}

#[test]
fn a_denied_client_recovers_after_the_window() {
    let clock = ManualClock::new();
    let limiter = RateLimiter::with_clock(Arc::new(clock.clone()));
    let policy = Policy::per_minute(5).unwrap();

    for _ in 0..5 {
        assert!(limiter.decide(key("a", "/api/contact"), &policy).is_allowed());
    }

    clock.advance(Duration::from_secs(10));
    let verdict = limiter.decide(key("a", "/api/contact"), &policy);
    assert_eq!(verdict.retry_after(), Some(Duration::from_secs(50)));
    assert_eq!(verdict.retry_after_secs(), Some(50));

    // Waiting out the advertised delay reaches the reset boundary, where
    // the next request opens a fresh window.
    clock.advance(Duration::from_secs(50));
    assert!(limiter.decide(key("a", "/api/contact"), &policy).is_allowed());
}

#[test]
fn the_reaper_keeps_the_store_bounded() {
    let store = Arc::new(WindowStore::new());
    let clock = ManualClock::new();
    let policy = Policy::per_minute(5).unwrap();
    let reaper = Reaper::new(
        Arc::clone(&store),
        Arc::new(clock.clone()),
        Duration::from_secs(60),
    );

    for i in 0..100 {
        store.insert(
            key(&format!("10.0.0.{i}"), "/api/contact"),
            Window::open(clock.now(), &policy),
        );
    }
    assert_eq!(store.len(), 100);

    // Nothing has expired yet, so the sweep is a no-op.
    assert_eq!(reaper.sweep(), 0);

    clock.advance(Duration::from_secs(60));
    assert_eq!(reaper.sweep(), 100);
    assert!(store.is_empty());
}
