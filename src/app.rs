use std::io::{BufRead, Write};

use anyhow::Context;
use log::*;

use crate::{
    config::AppConfig,
    console::{self, Console},
    gateway::MutationGateway,
    persistence::Persistence,
    store::{EntityStore, LoadSummary},
};

/// The main application
pub struct RecordKeepApp {}

impl RecordKeepApp {
    /// Loads products and orders, then runs the order manager menu.
    /// Any persistence implementation and console can be plugged in
    pub fn run_shop<P, R, W>(
        persistence: P,
        config: &AppConfig,
        console: &mut Console<R, W>,
    ) -> anyhow::Result<()>
    where
        P: Persistence,
        R: BufRead,
        W: Write,
    {
        let (mut gateway, summary) = Self::load_shop(persistence, config)?;
        if summary.skipped_items > 0 {
            console.show(format!(
                "{} order items refer to unknown products and were skipped.",
                summary.skipped_items
            ))?;
        }

        console::run_shop(console, &mut gateway, config.reports.low_stock_threshold)?;
        Ok(())
    }

    /// Loads students and teachers, then runs the school menu
    pub fn run_school<P, R, W>(
        persistence: P,
        config: &AppConfig,
        console: &mut Console<R, W>,
    ) -> anyhow::Result<()>
    where
        P: Persistence,
        R: BufRead,
        W: Write,
    {
        let mut gateway = Self::load_school(persistence, config)?;
        console::run_school(console, &mut gateway, config.reports.low_stock_threshold)?;
        Ok(())
    }

    /// Products must be loaded before the orders so order items can be resolved
    pub fn load_shop<P: Persistence>(
        persistence: P,
        config: &AppConfig,
    ) -> anyhow::Result<(MutationGateway<P>, LoadSummary)> {
        let mut store = EntityStore::new();

        store.load_products(
            persistence
                .load_products()
                .context("Failed to load products")?,
        );
        let summary = store.load_orders(persistence.load_orders().context("Failed to load orders")?);
        if summary.skipped_items > 0 {
            warn!(
                "{} order items were skipped while loading",
                summary.skipped_items
            );
        }

        Ok((
            MutationGateway::new(store, persistence, config.ids.clone()),
            summary,
        ))
    }

    pub fn load_school<P: Persistence>(
        persistence: P,
        config: &AppConfig,
    ) -> anyhow::Result<MutationGateway<P>> {
        let mut store = EntityStore::new();

        store.load_students(
            persistence
                .load_students()
                .context("Failed to load students")?,
        );
        store.load_teachers(
            persistence
                .load_teachers()
                .context("Failed to load teachers")?,
        );

        Ok(MutationGateway::new(store, persistence, config.ids.clone()))
    }
}
