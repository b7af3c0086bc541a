//! Retry a few flaky calls and print how each one ended.
//!
//! Run with `RUST_LOG=debug` to see the retry events.
use snooze::prelude::*;
use std::time::Duration;

fn even_draw() -> Result<u16, u16> {
    let num = rand::random::<u16>();
    if num % 2 == 0 {
        Ok(num)
    } else {
        Err(num)
    }
}

fn wild_call() -> i32 {
    3
}

fn report(label: &str, status: i32) {
    if status == 0 {
        println!("{label}: success!");
    } else {
        println!("{label}: failure (status {status})");
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let executor = RetryExecutor::builder().trailing_sleep(TrailingSleep::Skip).build();

    match executor.run(3, Duration::from_millis(1), even_draw) {
        Ok(n) => println!("num is even: {n}"),
        Err(err) => println!("gave up: {err}"),
    }

    report("wild call", executor.execute(3, MILLISECOND, wild_call));
    report("instant success", executor.execute(3, MILLISECOND, || 0));
    report("no budget", executor.execute(0, MILLISECOND, wild_call));

    let mut total = 2;
    let status = retry_fn(3, MICROSECOND, || {
        total += 2;
        if total >= 6 {
            0
        } else {
            1
        }
    });
    report("counter", status);
    println!("total = {total}");
}
