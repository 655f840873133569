//! Heartbeat supervision example.
//!
//! A producer thread feeds heartbeats into a [TimedSwitch] for a while and
//! then stops. As long as heartbeats keep arriving the switch stays on; once
//! they stop, the switch expires and the registered callback reports the
//! lost link.
use std::thread;
use std::time::{Duration, SystemTime};

use holdoff::{ExpiryCallback, TimedSwitch};
use log::{info, warn};

struct LinkInfo {
    name: &'static str,
}

fn link_lost(link: &LinkInfo) {
    warn!("heartbeat link {} lost", link.name);
}

fn setup_logger() -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                humantime::format_rfc3339_seconds(SystemTime::now()),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Info)
        .chain(std::io::stdout())
        .apply()?;
    Ok(())
}

fn main() {
    setup_logger().expect("setting up logging with fern failed");
    let switch = TimedSwitch::with_callback(
        Duration::from_millis(500),
        ExpiryCallback::new(link_lost, LinkInfo { name: "uplink-0" }),
    );
    info!("heartbeat switch armed with a {:?} deadline", switch.duration());

    let heartbeat_source = {
        let switch = switch.clone();
        thread::spawn(move || {
            for count in 0..6 {
                thread::sleep(Duration::from_millis(300));
                info!("heartbeat {count}");
                switch.on();
            }
        })
    };
    heartbeat_source
        .join()
        .expect("heartbeat source thread panicked");
    info!("heartbeat source stopped, switch state is {:?}", switch.state());

    while switch.is_on() {
        thread::sleep(Duration::from_millis(50));
    }
    info!("switch state is {:?}", switch.state());
}
