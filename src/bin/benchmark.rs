use chrono::{Datelike, Duration as ChronoDuration, Utc};
use colored::*;
use governor::{Quota, RateLimiter};
use hdrhistogram::Histogram;
use reqwest::Client;
use serde_json::{json, Value};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

const DURATION_SECS: u64 = 20;
const SEED_SESSIONS: usize = 50;

struct Target {
    name: &'static str,
    url: String,
}

#[tokio::main]
async fn main() {
    let base_url = std::env::var("BENCH_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

    println!("{}", "🚀 Starting Benchmark Suite".bold().green());
    println!("Target URL: {}", base_url);

    let client = Client::builder()
        .pool_max_idle_per_host(1000)
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap();

    if client.get(format!("{}/health", base_url)).send().await.is_err() {
        eprintln!("{}", format!("❌ Server is NOT reachable at {}. Please start it first.", base_url).red().bold());
        return;
    }

    println!("\n{}", "⚙️  Setting up benchmark data...".yellow());
    let session_id = setup_sessions(&client, &base_url).await;
    println!("{}", "✅ Data created successfully.".green());
    println!("   Sessions: {}", SEED_SESSIONS);

    let today = Utc::now().date_naive();
    let month_end = today + ChronoDuration::days(30);
    let year_end = today + ChronoDuration::days(365);

    let targets = vec![
        Target {
            name: "Health Check",
            url: format!("{}/health", base_url),
        },
        Target {
            name: "All Occurrences (30 days)",
            url: format!("{}/api/v1/sessions?start={}&end={}", base_url, today, month_end),
        },
        Target {
            name: "Single Session Occurrences (365 days)",
            url: format!("{}/api/v1/sessions/{}/occurrences?start={}&end={}", base_url, session_id, today, year_end),
        },
        Target {
            name: "Session Detail",
            url: format!("{}/api/v1/sessions/{}", base_url, session_id),
        },
    ];

    let rps_stages = vec![10, 50, 200, 1000];

    for target in targets {
        println!("\n{}", "=".repeat(60));
        println!("Benchmarking Endpoint: {}", target.name.cyan().bold());
        println!("URL: {}", target.url);
        println!("{}", "=".repeat(60));

        println!("{:<10} | {:<15} | {:<15} | {:<15}", "RPS", "Mean (ms)", "P99 (ms)", "Success Rate");
        println!("{:-<10}-+-{:-<15}-+-{:-<15}-+-{:-<15}", "", "", "", "");

        for &rps in &rps_stages {
            run_stage(&client, &target, rps).await;
        }
    }
}

/// Creates weekly sessions spread over the week, each with a cancelled and a
/// moved occurrence. Returns the id of the first one.
async fn setup_sessions(client: &Client, base_url: &str) -> String {
    let mut first_id = None;

    for i in 0..SEED_SESSIONS {
        let day = Utc::now().date_naive() + ChronoDuration::days((i % 7) as i64);
        let anchor = day.and_hms_opt(8 + (i % 10) as u32, 0, 0).unwrap().and_utc();

        let res = client.post(format!("{}/api/v1/sessions", base_url))
            .json(&json!({
                "title": format!("Benchmark Session {}", i),
                "description": "Load testing",
                "session_type": "recurring",
                "recurrence_day": day.weekday().num_days_from_monday(),
                "start_datetime": anchor.to_rfc3339(),
                "timezone": "Europe/Berlin",
                "duration_minutes": 45
            }))
            .send()
            .await
            .expect("Failed to send session create request");

        if !res.status().is_success() {
            let status = res.status();
            let txt = res.text().await.unwrap_or_default();
            panic!("Failed to create session. Status: {}. Body: {}", status, txt);
        }

        let body: Value = res.json().await.expect("Failed to parse session response");
        let id = body["id"].as_str().expect("No session id").to_string();

        let cancelled = day + ChronoDuration::days(7);
        let moved = day + ChronoDuration::days(14);
        client.delete(format!("{}/api/v1/sessions/{}/occurrences/{}", base_url, id, cancelled))
            .send()
            .await
            .expect("Failed to cancel occurrence");
        client.patch(format!("{}/api/v1/sessions/{}/occurrences/{}", base_url, id, moved))
            .json(&json!({ "new_datetime": (anchor + ChronoDuration::days(14) + ChronoDuration::hours(2)).to_rfc3339() }))
            .send()
            .await
            .expect("Failed to move occurrence");

        first_id.get_or_insert(id);
    }

    first_id.expect("No session created")
}

async fn run_stage(client: &Client, target: &Target, rps: u32) {
    let limiter = Arc::new(RateLimiter::direct(
        Quota::per_second(NonZeroU32::new(rps).unwrap())
    ));

    let (tx, mut rx) = mpsc::channel(50000);
    let start_time = Instant::now();
    let duration = Duration::from_secs(DURATION_SECS);

    loop {
        if start_time.elapsed() > duration {
            break;
        }

        if limiter.check().is_ok() {
            let client = client.clone();
            let url = target.url.clone();
            let tx = tx.clone();

            tokio::spawn(async move {
                let req_start = Instant::now();
                let res = client.get(&url).send().await;
                let latency = req_start.elapsed();

                let success = match res {
                    Ok(r) => r.status().is_success(),
                    Err(_) => false,
                };

                let _ = tx.send((latency, success)).await;
            });
        } else {
            tokio::task::yield_now().await;
        }
    }

    drop(tx);

    let mut histogram = Histogram::<u64>::new(3).unwrap();
    let mut successes = 0;
    let mut total = 0;

    while let Some((latency, success)) = rx.recv().await {
        total += 1;
        if success { successes += 1; }
        histogram.record(latency.as_micros() as u64).unwrap();
    }

    let mean_ms = histogram.mean() / 1000.0;
    let p99_ms = histogram.value_at_quantile(0.99) as f64 / 1000.0;
    let success_rate = if total > 0 { (successes as f64 / total as f64) * 100.0 } else { 0.0 };

    println!(
        "{:<10} | {:<15.2} | {:<15.2} | {:<14.1}%",
        rps,
        mean_ms,
        p99_ms,
        success_rate
    );

    tokio::time::sleep(Duration::from_millis(500)).await;
}
