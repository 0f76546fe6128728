pub mod core {
    pub mod config;
    pub mod error;
    pub mod extract;
    pub mod routes;
    pub mod startup;
    pub mod state;
    pub mod tracing_init;
    #[cfg(test)]
    pub(crate) mod test_support;
}

pub mod handlers {
    pub mod auth;
    pub mod collection;
    pub mod fallback;
    pub mod health;
    pub mod protected;
    pub mod sheets;
    pub mod table;
}

pub mod models {
    pub mod api;
    pub mod sheet;
    pub mod user;
}

pub mod security {
    pub mod gate;
    pub mod password;
    pub mod session;
    pub mod token;
}

pub mod stores {
    pub mod active_collection;
    pub mod database;
    pub mod sheet_registry;
    pub mod table_store;
    pub mod user_store;
}

pub mod utils {
    pub mod time;
}

pub mod wal {
    #[allow(clippy::module_inception)]
    pub mod wal;
}
