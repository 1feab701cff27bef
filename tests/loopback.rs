//! End-to-end runs of `SntpClient` against a scripted UDP server on loopback.

#![cfg(feature = "runtime")]

use std::net::SocketAddr;
use std::time::Duration;

use sntp_clock::EpochSeconds;
use sntp_clock::client::SntpClient;
use sntp_clock::core::{NTP_MSG_LEN, ResponseError, SyncFailure};
use sntp_clock::sync::{AttemptOutcome, SyncConfig, SyncConfigBuilder, SyncStats};
use tokio::net::UdpSocket;
use tokio::sync::watch;

const WAIT: Duration = Duration::from_secs(5);

fn reply(stratum: u8, seconds: u32) -> [u8; NTP_MSG_LEN] {
    let mut buf = [0u8; NTP_MSG_LEN];
    buf[0] = 0x24;
    buf[1] = stratum;
    buf[40..44].copy_from_slice(&seconds.to_be_bytes());
    buf
}

fn config_for(server: SocketAddr) -> SyncConfig {
    SyncConfigBuilder::new()
        .server_host(server.ip().to_string())
        .server_port(server.port())
        .poll_interval(Duration::from_secs(60))
        .resend_timeout(Duration::from_millis(200))
        .bind_addr("127.0.0.1:0".parse().unwrap())
        .build()
        .unwrap()
}

/// Bind a server that answers every request with `response`, if any.
async fn spawn_server(response: Option<[u8; NTP_MSG_LEN]>) -> SocketAddr {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = socket.local_addr().unwrap();

    tokio::spawn(async move {
        let mut buf = [0u8; 512];
        loop {
            let Ok((len, from)) = socket.recv_from(&mut buf).await else {
                break;
            };
            assert_eq!(len, NTP_MSG_LEN);
            assert_eq!(buf[0], 0x1B);
            if let Some(response) = response {
                let _ = socket.send_to(&response, from).await;
            }
        }
    });

    addr
}

async fn wait_for(
    stats: &mut watch::Receiver<SyncStats>,
    done: impl FnMut(&SyncStats) -> bool,
) -> SyncStats {
    tokio::time::timeout(WAIT, stats.wait_for(done))
        .await
        .expect("timed out waiting for stats")
        .expect("client stopped")
        .clone()
}

#[tokio::test]
async fn test_valid_reply_publishes_time() {
    let server = spawn_server(Some(reply(1, 3_913_056_000))).await;
    let client = SntpClient::start(config_for(server)).await.unwrap();
    let reader = client.reader();
    let mut stats = client.stats();

    let seen = wait_for(&mut stats, |s| s.successes == 1).await;

    assert_eq!(reader.read(), EpochSeconds::from_secs(1_704_067_200));
    assert_eq!(seen.attempts, 1);
    assert_eq!(seen.failures(), 0);
    assert!(seen.last_round_trip.is_some());

    client.shutdown().await;
}

async fn assert_first_attempt_succeeds() {
    let server = spawn_server(Some(reply(1, 3_913_056_000))).await;
    let client = SntpClient::start(config_for(server)).await.unwrap();
    let mut stats = client.stats();

    let seen = wait_for(&mut stats, |s| s.last_outcome.is_some()).await;

    assert_eq!(seen.attempts, 1);
    assert_eq!(seen.successes, 1);
    assert_eq!(seen.timeouts, 0);
    assert_eq!(client.now(), EpochSeconds::from_secs(1_704_067_200));

    client.shutdown().await;
}

#[tokio::test]
async fn test_first_attempt_sends_immediately() {
    assert_first_attempt_succeeds().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_first_attempt_sends_immediately_multi_thread() {
    assert_first_attempt_succeeds().await;
}

#[tokio::test]
async fn test_silent_server_times_out() {
    let server = spawn_server(None).await;
    let client = SntpClient::start(config_for(server)).await.unwrap();
    let mut stats = client.stats();

    let seen = wait_for(&mut stats, |s| s.timeouts == 1).await;

    assert!(client.now().is_unknown());
    assert_eq!(
        seen.last_outcome,
        Some(AttemptOutcome::Failed(SyncFailure::ResponseTimeout))
    );

    client.shutdown().await;
}

#[tokio::test]
async fn test_unsynchronized_server_rejected() {
    let server = spawn_server(Some(reply(0, 3_913_056_000))).await;
    let client = SntpClient::start(config_for(server)).await.unwrap();
    let mut stats = client.stats();

    let seen = wait_for(&mut stats, |s| s.invalid_responses == 1).await;

    assert!(client.now().is_unknown());
    assert_eq!(
        seen.last_outcome,
        Some(AttemptOutcome::Failed(SyncFailure::ResponseInvalid(
            ResponseError::Unsynchronized
        )))
    );

    client.shutdown().await;
}

#[tokio::test]
async fn test_resync_starts_second_attempt() {
    let server = spawn_server(Some(reply(2, 3_913_056_010))).await;
    let client = SntpClient::start(config_for(server)).await.unwrap();
    let mut stats = client.stats();

    wait_for(&mut stats, |s| s.successes == 1).await;
    assert!(client.resync());
    let seen = wait_for(&mut stats, |s| s.successes == 2).await;

    assert_eq!(seen.attempts, 2);
    assert_eq!(client.now(), EpochSeconds::from_secs(1_704_067_210));

    client.shutdown().await;
}
