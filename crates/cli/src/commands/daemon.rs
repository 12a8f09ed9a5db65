// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dr status` and `dr shutdown` - Daemon control

use anyhow::Result;

use crate::client::DaemonClient;

pub async fn status(client: &DaemonClient) -> Result<()> {
    let version = client.hello().await?;
    let status = client.status().await?;

    println!("drd {} running", version);
    println!("  Uptime: {}", format_uptime(status.uptime_secs));
    println!("  Active runs: {}", status.runs_active);
    println!(
        "  Queue: {} executing, {} waiting",
        status.queue_pending, status.queue_size
    );
    Ok(())
}

pub async fn shutdown(client: &DaemonClient) -> Result<()> {
    client.shutdown().await?;
    println!("Daemon shutting down");
    Ok(())
}

fn format_uptime(secs: u64) -> String {
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{}h {}m {}s", h, m, s)
    } else if m > 0 {
        format!("{}m {}s", m, s)
    } else {
        format!("{}s", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uptime_formatting() {
        assert_eq!(format_uptime(5), "5s");
        assert_eq!(format_uptime(125), "2m 5s");
        assert_eq!(format_uptime(3725), "1h 2m 5s");
    }
}
