//! Framed record transfer over a [`StreamConnection`].
//!
//! A record is sent as exactly `T::SIZE` bytes and received the same way.
//! There are no delimiters and no length prefixes; both sides know which
//! record comes next from the request that preceded it.

use std::time::{Duration, Instant};

use super::records::WireRecord;
use super::serialization::{RecordReader, RecordWriter, MAX_RECORD_SIZE};
use crate::error::{ConnError, ConnResult};
use crate::transport::StreamConnection;

/// Encodes `value` and sends all `T::SIZE` bytes.
///
/// # Errors
///
/// Whatever [`StreamConnection::send`] reports.
pub fn send_record<T: WireRecord>(conn: &mut StreamConnection, value: &T) -> ConnResult<()> {
    let mut writer = RecordWriter::new();
    if !value.encode(&mut writer) {
        return Err(ConnError::InvalidArgument("record larger than the encode buffer"));
    }
    debug_assert_eq!(writer.len(), T::SIZE);
    conn.send(writer.as_slice())
}

/// Receives exactly `T::SIZE` bytes within `timeout` and decodes them.
///
/// `timeout` bounds the whole record, not each chunk.
///
/// # Errors
///
/// - [`ConnError::Timeout`] if nothing arrived; the connection stays open
/// - [`ConnError::ShortRead`] if the record was cut off; the stream is out of
///   step afterwards, so the connection is closed
/// - [`ConnError::Closed`] if the peer went away
pub fn receive_record<T: WireRecord>(
    conn: &mut StreamConnection,
    timeout: Option<Duration>,
) -> ConnResult<T> {
    let mut storage = [0u8; MAX_RECORD_SIZE];
    let buf = &mut storage[..T::SIZE];
    let deadline = timeout.map(|t| Instant::now() + t);
    let mut filled = 0;

    while filled < T::SIZE {
        let remaining = deadline.map(|d| d.saturating_duration_since(Instant::now()));
        match conn.receive(&mut buf[filled..], remaining) {
            Ok(n) => filled += n,
            Err(ConnError::Timeout) if filled == 0 => return Err(ConnError::Timeout),
            Err(ConnError::Timeout) => {
                tracing::warn!("record cut off after {} of {} bytes", filled, T::SIZE);
                conn.close();
                return Err(ConnError::ShortRead {
                    expected: T::SIZE,
                    received: filled,
                });
            }
            Err(e) => return Err(e),
        }
    }

    T::decode(&mut RecordReader::new(buf)).ok_or(ConnError::ShortRead {
        expected: T::SIZE,
        received: filled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::records::{BallInfo, RobotInfo};
    use crate::transport::ConnectionState;

    fn pair() -> (StreamConnection, StreamConnection, StreamConnection) {
        let mut server = StreamConnection::new();
        server.listen(0, 5).unwrap();
        let port = server.local_addr().unwrap().port();
        let mut client = StreamConnection::new();
        client.connect("127.0.0.1", port).unwrap();
        let remote = server.accept().unwrap();
        (server, client, remote)
    }

    #[test]
    fn test_record_crosses_the_wire() {
        let (_server, mut client, mut remote) = pair();
        let info = RobotInfo {
            id: 1,
            team: 1,
            x: 3.5,
            y: -2.0,
            rot: 90.0,
        };
        send_record(&mut client, &info).unwrap();
        let back: RobotInfo = receive_record(&mut remote, Some(Duration::from_secs(2))).unwrap();
        assert_eq!(back, info);
    }

    #[test]
    fn test_record_split_across_writes() {
        let (_server, mut client, mut remote) = pair();
        let mut writer = RecordWriter::new();
        assert!(BallInfo { x: 1.0, y: 2.0 }.encode(&mut writer));
        let bytes = writer.as_slice().to_vec();

        client.send(&bytes[..5]).unwrap();
        let sender = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            client.send(&bytes[5..]).unwrap();
            client
        });

        let ball: BallInfo = receive_record(&mut remote, Some(Duration::from_secs(2))).unwrap();
        assert_eq!(ball, BallInfo { x: 1.0, y: 2.0 });
        drop(sender.join().unwrap());
    }

    #[test]
    fn test_short_read_fails_and_closes() {
        let (_server, mut client, mut remote) = pair();
        client.send(&[0u8; 10]).unwrap();

        let err = receive_record::<RobotInfo>(&mut remote, Some(Duration::from_millis(100))).unwrap_err();
        assert!(matches!(err, ConnError::ShortRead { expected: 32, received: 10 }));
        assert_eq!(remote.state(), ConnectionState::Closed);
    }

    #[test]
    fn test_nothing_arrived_is_timeout() {
        let (_server, _client, mut remote) = pair();
        let err = receive_record::<i32>(&mut remote, Some(Duration::from_millis(20))).unwrap_err();
        assert!(err.is_timeout());
        assert!(remote.is_open());
    }

    #[test]
    fn test_peer_gone_is_closed() {
        let (_server, mut client, mut remote) = pair();
        client.send(&[1, 2]).unwrap();
        client.close();
        let err = receive_record::<i32>(&mut remote, Some(Duration::from_secs(2))).unwrap_err();
        assert!(matches!(err, ConnError::Closed));
    }
}
