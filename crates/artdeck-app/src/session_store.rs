//! Registry of connected clients
//!
//! Clients get their state on connect and lose it on disconnect. The store
//! also remembers when the last client left, which drives idle shutdown of
//! the web process.

use std::collections::HashMap;
use std::time::Instant;

use artdeck_core::prelude::*;

type CreateHook<T> = Box<dyn Fn(&str) -> T + Send + Sync>;
type DestroyHook<T> = Box<dyn FnMut(&str, T) + Send + Sync>;

pub struct SessionStore<T> {
    sessions: HashMap<String, T>,
    on_create: CreateHook<T>,
    on_destroy: Option<DestroyHook<T>>,
    last_disconnect: Instant,
}

impl<T> std::fmt::Debug for SessionStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("sessions", &self.sessions.len())
            .field("last_disconnect", &self.last_disconnect)
            .finish()
    }
}

impl<T> SessionStore<T> {
    pub fn new<F>(on_create: F) -> Self
    where
        F: Fn(&str) -> T + Send + Sync + 'static,
    {
        Self {
            sessions: HashMap::new(),
            on_create: Box::new(on_create),
            on_destroy: None,
            last_disconnect: Instant::now(),
        }
    }

    /// Called with the state of every client that disconnects
    pub fn on_destroy<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&str, T) + Send + Sync + 'static,
    {
        self.on_destroy = Some(Box::new(hook));
        self
    }

    /// State of a client, created on first contact
    pub fn connect(&mut self, client: &str) -> &mut T {
        let on_create = &self.on_create;
        self.sessions.entry(client.to_string()).or_insert_with(|| {
            debug!("Client {} connected", client);
            on_create(client)
        })
    }

    /// Drop a client; returns whether it was connected
    pub fn disconnect(&mut self, client: &str) -> bool {
        let Some(state) = self.sessions.remove(client) else {
            return false;
        };
        self.last_disconnect = Instant::now();
        if let Some(hook) = self.on_destroy.as_mut() {
            hook(client, state);
        }
        debug!("Client {} disconnected", client);
        true
    }

    pub fn get(&self, client: &str) -> Option<&T> {
        self.sessions.get(client)
    }

    pub fn get_mut(&mut self, client: &str) -> Option<&mut T> {
        self.sessions.get_mut(client)
    }

    pub fn contains(&self, client: &str) -> bool {
        self.sessions.contains_key(client)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn last_disconnect(&self) -> Instant {
        self.last_disconnect
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut T)> {
        self.sessions.iter_mut()
    }

    /// Disconnect every client
    pub fn clear(&mut self) {
        let clients: Vec<String> = self.sessions.keys().cloned().collect();
        for client in clients {
            self.disconnect(&client);
        }
    }
}
