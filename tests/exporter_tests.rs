//! Exporter Tests
//!
//! Scrape the balance collector and the HTTP handler against a fake bank module.

use anyhow::Result;
use async_trait::async_trait;
use axum::body::to_bytes;
use axum::extract::State;
use axum::http::StatusCode;
use cosmrs::AccountId;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tgrade_tools::api::metrics;
use tgrade_tools::metrics::{BalanceCollector, BalanceQuerier};

struct FakeBank {
    // address -> (liquid, total)
    balances: HashMap<String, (u128, u128)>,
    delay: Option<Duration>,
}

#[async_trait]
impl BalanceQuerier for FakeBank {
    async fn liquid_balance(&self, address: &AccountId) -> Result<u128> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.balances
            .get(address.as_ref())
            .map(|(liquid, _)| *liquid)
            .ok_or_else(|| anyhow::anyhow!("account {address} not found"))
    }

    async fn total_balance(&self, address: &AccountId) -> Result<u128> {
        self.balances
            .get(address.as_ref())
            .map(|(_, total)| *total)
            .ok_or_else(|| anyhow::anyhow!("account {address} not found"))
    }
}

fn account(seed: u8) -> AccountId {
    AccountId::new("tgrade", &[seed; 20]).unwrap()
}

fn collector(bank: FakeBank, addresses: Vec<AccountId>) -> BalanceCollector {
    BalanceCollector::new(Arc::new(bank), addresses, Duration::from_millis(500))
}

#[tokio::test]
async fn test_scrape_reports_liquid_and_total_balances() -> Result<()> {
    let (a, b) = (account(1), account(2));
    let bank = FakeBank {
        balances: HashMap::from([
            (a.to_string(), (1_500_000, 9_000_000)),
            (b.to_string(), (0, 42)),
        ]),
        delay: None,
    };

    let body = collector(bank, vec![a.clone(), b.clone()]).render().await?;

    assert!(body.contains("# TYPE liquid_balance gauge"));
    assert!(body.contains("# TYPE total_balance gauge"));
    assert!(body.contains(&format!("liquid_balance{{account=\"{a}\"}} 1500000")));
    assert!(body.contains(&format!("total_balance{{account=\"{a}\"}} 9000000")));
    assert!(body.contains(&format!("liquid_balance{{account=\"{b}\"}} 0")));
    assert!(body.contains(&format!("total_balance{{account=\"{b}\"}} 42")));
    assert!(body.contains("tgrade_tools_build_info{version="));

    println!("✅ Balance scrape test passed");
    Ok(())
}

#[tokio::test]
async fn test_failing_account_is_left_out_of_scrape() -> Result<()> {
    let (known, unknown) = (account(1), account(3));
    let bank = FakeBank {
        balances: HashMap::from([(known.to_string(), (7, 8))]),
        delay: None,
    };

    let body = collector(bank, vec![unknown.clone(), known.clone()]).render().await?;

    assert!(!body.contains(&unknown.to_string()));
    assert!(body.contains(&format!("liquid_balance{{account=\"{known}\"}} 7")));
    assert!(body.contains(&format!("total_balance{{account=\"{known}\"}} 8")));

    println!("✅ Failing account scrape test passed");
    Ok(())
}

#[tokio::test]
async fn test_slow_node_times_out_scrape() -> Result<()> {
    let a = account(1);
    let bank = FakeBank {
        balances: HashMap::from([(a.to_string(), (1, 2))]),
        delay: Some(Duration::from_secs(5)),
    };

    let collector = BalanceCollector::new(Arc::new(bank), vec![a.clone()], Duration::from_millis(50));
    let body = collector.render().await?;

    assert!(!body.contains("liquid_balance{"));
    assert!(body.contains("tgrade_tools_build_info"));
    Ok(())
}

#[tokio::test]
async fn test_metrics_handler_serves_text_format() -> Result<()> {
    let a = account(9);
    let bank = FakeBank {
        balances: HashMap::from([(a.to_string(), (10, 20))]),
        delay: None,
    };

    let response = metrics(State(Arc::new(collector(bank, vec![a.clone()])))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/plain"));

    let body = to_bytes(response.into_body(), usize::MAX).await?;
    let body = String::from_utf8(body.to_vec())?;
    assert!(body.contains(&format!("total_balance{{account=\"{a}\"}} 20")));

    println!("✅ Metrics handler test passed");
    Ok(())
}
