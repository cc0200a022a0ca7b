//! Integration tests for the client session against a scripted server.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use soccer_env::protocol::{receive_record, send_record, ClientCommand, RobotStatus};
use soccer_env::{
    ConnError, MatchSession, SessionConfig, SessionError, SessionPhase, StreamConnection,
};
use soccer_geom::Point;

const WAIT: Option<Duration> = Some(Duration::from_secs(5));

/// Listens on a free port and runs `script` against the first client.
fn scripted_server<F>(script: F) -> (u16, JoinHandle<()>)
where
    F: FnOnce(StreamConnection) + Send + 'static,
{
    let mut listener = StreamConnection::new();
    listener.listen(0, 5).unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = thread::spawn(move || {
        let peer = listener.accept().unwrap();
        script(peer);
    });
    (port, handle)
}

fn expect_command(conn: &mut StreamConnection, command: ClientCommand) {
    let code: i32 = receive_record(conn, WAIT).unwrap();
    assert_eq!(code, command.code());
}

/// World description for a 1500 x 1300 court with two robots.
fn send_world(conn: &mut StreamConnection, count: i32) {
    send_record(conn, &count).unwrap();
    for value in [37.5_f32, 750.0, 650.0, 200.0, 100.0] {
        send_record(conn, &value).unwrap();
    }
}

fn robot_at(x: f32, y: f32, heading: f32) -> RobotStatus {
    RobotStatus {
        position: Point::new(x, y),
        heading,
        previous_position: Point::new(x, y),
        previous_heading: heading,
        obstacle: Point::new(x, 650.0),
        ..RobotStatus::default()
    }
}

fn send_status(conn: &mut StreamConnection, ball: Point, robots: &[RobotStatus], scores: [i32; 2]) {
    send_record(conn, &ball).unwrap();
    send_record(conn, &(robots.len() as i32)).unwrap();
    for robot in robots {
        send_record(conn, robot).unwrap();
    }
    send_record(conn, &scores[0]).unwrap();
    send_record(conn, &scores[1]).unwrap();
}

/// Blocks until the client hangs up.
fn wait_for_hangup(conn: &mut StreamConnection) {
    assert!(receive_record::<i32>(conn, None).is_err());
}

fn quick_session() -> MatchSession {
    MatchSession::with_config(SessionConfig {
        handshake_timeout: Duration::from_millis(100),
        record_timeout: Some(Duration::from_secs(2)),
        max_timeout_retries: 2,
    })
}

#[test]
fn test_handshake_and_act_as_player_one() {
    let robots = [robot_at(-300.0, 0.0, 0.0), robot_at(300.0, 100.0, 3.0)];
    let (port, server) = scripted_server(move |mut conn| {
        send_record(&mut conn, &1_i32).unwrap();
        expect_command(&mut conn, ClientCommand::GetWorld);
        send_world(&mut conn, 2);
        expect_command(&mut conn, ClientCommand::GetMatchStatus);
        send_status(&mut conn, Point::new(100.0, 50.0), &robots, [3, 1]);

        expect_command(&mut conn, ClientCommand::Act);
        let id: i32 = receive_record(&mut conn, WAIT).unwrap();
        let left: f32 = receive_record(&mut conn, WAIT).unwrap();
        let right: f32 = receive_record(&mut conn, WAIT).unwrap();
        assert_eq!((id, left, right), (1, 0.25, -0.5));

        let mut moved = robots;
        moved[1].position = Point::new(290.0, 100.0);
        moved[1].previous_position = robots[1].position;
        send_status(&mut conn, Point::new(120.0, 50.0), &moved, [3, 2]);
        wait_for_hangup(&mut conn);
    });

    let mut session = MatchSession::new();
    session.connect("127.0.0.1", port).unwrap();

    assert_eq!(session.phase(), SessionPhase::Ready);
    assert!(session.is_ready());
    assert_eq!(session.id(), Some(1));
    assert_eq!(session.world_width(), 1500.0);
    assert_eq!(session.world_height(), 1300.0);
    assert_eq!(session.goal_length(), 400.0);
    assert_eq!(session.goal_depth(), 100.0);
    assert_eq!(session.robot_radius(), 37.5);
    assert_eq!(session.ball(), Point::new(100.0, 50.0));

    // Player 1 attacks the left goal and is credited with left-goal scores.
    assert_eq!(session.own_goal(), Point::new(-750.0, 0.0));
    assert_eq!(session.rival_goal(), Point::new(750.0, 0.0));
    assert_eq!(session.own_score(), 3);
    assert_eq!(session.rival_score(), 1);
    assert_eq!(session.own_robot().position, Point::new(300.0, 100.0));
    assert_eq!(session.rival_robot().position, Point::new(-300.0, 0.0));
    assert!((session.distance() - ((200.0_f32 * 200.0 + 50.0 * 50.0).sqrt() - 37.5)).abs() < 1e-3);

    session.act(0.25, -0.5).unwrap();
    assert_eq!(session.ball(), Point::new(120.0, 50.0));
    assert_eq!(session.own_robot().position, Point::new(290.0, 100.0));
    assert_eq!(session.rival_score(), 2);
    assert_eq!(session.spin(), 0.0);

    session.disconnect();
    assert_eq!(session.phase(), SessionPhase::Closed);
    assert!(matches!(session.act(0.0, 0.0), Err(SessionError::NotReady)));
    server.join().unwrap();
}

#[test]
fn test_invalid_id_closes_session() {
    let (port, server) = scripted_server(|mut conn| {
        send_record(&mut conn, &5_i32).unwrap();
        wait_for_hangup(&mut conn);
    });

    let mut session = quick_session();
    let err = session.connect("127.0.0.1", port).unwrap_err();
    assert!(matches!(err, SessionError::InvalidId(5)));
    assert_eq!(session.phase(), SessionPhase::Closed);
    assert_eq!(session.id(), None);
    server.join().unwrap();
}

#[test]
fn test_roster_without_own_robot_is_rejected() {
    let (port, server) = scripted_server(|mut conn| {
        send_record(&mut conn, &1_i32).unwrap();
        expect_command(&mut conn, ClientCommand::GetWorld);
        send_world(&mut conn, 1);
        wait_for_hangup(&mut conn);
    });

    let mut session = quick_session();
    let err = session.connect("127.0.0.1", port).unwrap_err();
    assert!(matches!(err, SessionError::InvalidRoster(1)));
    assert_eq!(session.phase(), SessionPhase::Closed);
    server.join().unwrap();
}

#[test]
fn test_status_roster_mismatch_fails_handshake() {
    let (port, server) = scripted_server(|mut conn| {
        send_record(&mut conn, &0_i32).unwrap();
        expect_command(&mut conn, ClientCommand::GetWorld);
        send_world(&mut conn, 2);
        expect_command(&mut conn, ClientCommand::GetMatchStatus);
        let robots = [RobotStatus::default(); 3];
        send_status(&mut conn, Point::ZERO, &robots, [0, 0]);
        wait_for_hangup(&mut conn);
    });

    let mut session = quick_session();
    let err = session.connect("127.0.0.1", port).unwrap_err();
    assert!(matches!(
        err,
        SessionError::RosterMismatch {
            expected: 2,
            received: 3
        }
    ));
    assert_eq!(session.phase(), SessionPhase::Closed);
    assert!(!session.is_ready());
    server.join().unwrap();
}

#[test]
fn test_cut_off_record_fails() {
    let (port, server) = scripted_server(|mut conn| {
        send_record(&mut conn, &0_i32).unwrap();
        expect_command(&mut conn, ClientCommand::GetWorld);
        // Half of the robot count.
        conn.send(&[2, 0]).unwrap();
        wait_for_hangup(&mut conn);
    });

    let mut session = quick_session();
    let err = session.connect("127.0.0.1", port).unwrap_err();
    assert!(matches!(
        err,
        SessionError::Transport(ConnError::ShortRead {
            expected: 4,
            received: 2
        })
    ));
    assert_eq!(session.phase(), SessionPhase::Closed);
    server.join().unwrap();
}

#[test]
fn test_silent_server_exhausts_retries() {
    let (port, server) = scripted_server(|mut conn| {
        wait_for_hangup(&mut conn);
    });

    let mut session = quick_session();
    let err = session.connect("127.0.0.1", port).unwrap_err();
    assert!(matches!(
        err,
        SessionError::RetriesExhausted {
            what: "player id",
            retries: 2
        }
    ));
    assert_eq!(session.phase(), SessionPhase::Closed);
    server.join().unwrap();
}

#[test]
fn test_slow_rival_does_not_abort_a_turn() {
    let robots = [robot_at(-200.0, 0.0, 0.0), robot_at(200.0, 0.0, 0.0)];
    let (port, server) = scripted_server(move |mut conn| {
        send_record(&mut conn, &0_i32).unwrap();
        expect_command(&mut conn, ClientCommand::GetWorld);
        send_world(&mut conn, 2);
        expect_command(&mut conn, ClientCommand::GetMatchStatus);
        send_status(&mut conn, Point::ZERO, &robots, [0, 0]);

        expect_command(&mut conn, ClientCommand::Act);
        let id: i32 = receive_record(&mut conn, WAIT).unwrap();
        let forces: (f32, f32) = (
            receive_record(&mut conn, WAIT).unwrap(),
            receive_record(&mut conn, WAIT).unwrap(),
        );
        assert_eq!((id, forces), (0, (1.0, 1.0)));
        // The rival takes several handshake timeouts to answer.
        thread::sleep(Duration::from_millis(600));
        send_status(&mut conn, Point::new(40.0, 0.0), &robots, [0, 0]);
        wait_for_hangup(&mut conn);
    });

    let mut session = quick_session();
    session.connect("127.0.0.1", port).unwrap();
    session.act(1.0, 1.0).unwrap();
    assert_eq!(session.phase(), SessionPhase::Ready);
    assert_eq!(session.ball(), Point::new(40.0, 0.0));

    session.disconnect();
    server.join().unwrap();
}

#[test]
fn test_server_hangup_during_handshake() {
    let (port, server) = scripted_server(|mut conn| {
        send_record(&mut conn, &0_i32).unwrap();
        expect_command(&mut conn, ClientCommand::GetWorld);
        conn.close();
    });

    let mut session = quick_session();
    let err = session.connect("127.0.0.1", port).unwrap_err();
    assert!(matches!(err, SessionError::Transport(ConnError::Closed)));
    server.join().unwrap();
}

#[test]
fn test_pull_match_status_on_request() {
    let (port, server) = scripted_server(|mut conn| {
        send_record(&mut conn, &0_i32).unwrap();
        expect_command(&mut conn, ClientCommand::GetWorld);
        send_world(&mut conn, 2);
        expect_command(&mut conn, ClientCommand::GetMatchStatus);
        let robots = [robot_at(-100.0, 0.0, 0.0), robot_at(100.0, 0.0, 0.0)];
        send_status(&mut conn, Point::ZERO, &robots, [0, 0]);

        expect_command(&mut conn, ClientCommand::GetMatchStatus);
        send_status(&mut conn, Point::new(0.0, 300.0), &robots, [1, 0]);
        wait_for_hangup(&mut conn);
    });

    let mut session = quick_session();
    session.connect("127.0.0.1", port).unwrap();
    assert_eq!(session.own_goal(), Point::new(750.0, 0.0));

    session.pull_match_status(true).unwrap();
    assert_eq!(session.ball(), Point::new(0.0, 300.0));
    assert_eq!(session.own_score(), 0);
    assert_eq!(session.rival_score(), 1);
    assert!((session.ball_angle() - 300.0_f32.atan2(100.0)).abs() < 1e-5);
    assert_eq!(session.world().robot_count(), 2);
    session.disconnect();
    server.join().unwrap();
}

#[test]
fn test_reconnect_replaces_previous_match() {
    let script = |id: i32| {
        move |mut conn: StreamConnection| {
            send_record(&mut conn, &id).unwrap();
            expect_command(&mut conn, ClientCommand::GetWorld);
            send_world(&mut conn, 2);
            expect_command(&mut conn, ClientCommand::GetMatchStatus);
            send_status(&mut conn, Point::ZERO, &[RobotStatus::default(); 2], [0, 0]);
            wait_for_hangup(&mut conn);
        }
    };
    let (first_port, first) = scripted_server(script(0));
    let (second_port, second) = scripted_server(script(1));

    let mut session = quick_session();
    session.connect("127.0.0.1", first_port).unwrap();
    assert_eq!(session.id(), Some(0));

    session.connect("127.0.0.1", second_port).unwrap();
    assert_eq!(session.id(), Some(1));
    assert_eq!(session.own_goal(), Point::new(-750.0, 0.0));
    first.join().unwrap();

    drop(session);
    second.join().unwrap();
}
