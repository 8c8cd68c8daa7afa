use std::collections::HashMap;

use bevy::prelude::*;
use bevy::tasks::futures_lite::future;
use bevy::tasks::{IoTaskPool, Task, block_on};
use playback::{LoadOutcome, LoadTicket, NormalizedModel, ViewportError, ViewportId};

use super::components::{AssetAccess, SessionResource};

struct PendingLoad {
    ticket: LoadTicket,
    task: Task<Result<NormalizedModel, ViewportError>>,
}

/// In-flight loads, at most one per viewport. Dropping a task cancels it.
#[derive(Resource, Default)]
pub struct LoadTasks {
    pending: HashMap<ViewportId, PendingLoad>,
}

impl LoadTasks {
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn is_loading(&self, id: ViewportId) -> bool {
        self.pending.contains_key(&id)
    }
}

pub fn dispatch_load_tasks(
    mut session: ResMut<SessionResource>,
    access: Res<AssetAccess>,
    mut tasks: ResMut<LoadTasks>,
) {
    tasks.pending.retain(|_, load| session.is_current(&load.ticket));

    let tickets = session.take_pending_loads();
    if tickets.is_empty() {
        return;
    }
    let pool = IoTaskPool::get();
    for ticket in tickets {
        let loader = access.loader.clone();
        let request = ticket.request.clone();
        let task = pool.spawn(async move { loader.load_normalized(&request) });
        debug!("Loading '{}' into viewport {}", ticket.request.path, ticket.viewport.0);
        tasks
            .pending
            .insert(ticket.viewport, PendingLoad { ticket, task });
    }
}

pub fn poll_load_tasks(mut session: ResMut<SessionResource>, mut tasks: ResMut<LoadTasks>) {
    tasks.pending.retain(|_, load| {
        let Some(result) = block_on(future::poll_once(&mut load.task)) else {
            return true;
        };
        match session.complete_load(&load.ticket, result) {
            LoadOutcome::Applied => info!("Loaded '{}'", load.ticket.request.path),
            LoadOutcome::Failed => {}
            LoadOutcome::Discarded => {
                debug!("Discarded stale load of '{}'", load.ticket.request.path)
            }
        }
        false
    });
}

pub fn advance_session(time: Res<Time>, mut session: ResMut<SessionResource>) {
    session.tick(time.delta_secs());
}
