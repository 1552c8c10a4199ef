//! Three peers in one process: a host opens a lobby, two guests join, they
//! ping each other over a slightly lossy in-process network, then one guest
//! leaves.

mod app;
mod lobby;

use log::{error, info};

use peerlink_peer::{
    shared::PeerId,
    transport::local::{LinkConditionerConfig, LocalHub},
};

use app::App;
use lobby::Lobby;

const FRAMES: u32 = 30;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Peerlink Basic Demo started");

    let hub = LocalHub::with_conditioner(LinkConditionerConfig::average_condition());
    let mut lobby = Lobby::default();
    let mut apps: Vec<App> = Vec::new();

    for frame in 0..FRAMES {
        let joining = match frame {
            0 => Some(("host", "Host")),
            2 => Some(("guest1", "Guest One")),
            5 => Some(("guest2", "Guest Two")),
            _ => None,
        };
        if let Some((id, name)) = joining {
            let peer_id = lobby.join(id, name);
            let app = lobby
                .feed_mut(&peer_id)
                .ok_or_else(|| format!("{} has no lobby feed", peer_id))
                .and_then(|feed| App::new(&hub, &peer_id, feed));
            match app {
                Ok(app) => apps.push(app),
                Err(message) => error!("{}", message),
            }
        }

        if frame == 20 {
            lobby.leave(&PeerId::from("guest2"));
        }

        for app in apps.iter_mut() {
            let id = app.id().clone();
            app.update(lobby.feed_mut(&id));
        }

        if frame == 20 {
            let departed = PeerId::from("guest2");
            apps.retain(|app| *app.id() != departed);
            lobby.forget(&departed);
        }
    }

    for app in apps.iter_mut() {
        app.shutdown();
    }
    info!("Peerlink Basic Demo finished");
}
