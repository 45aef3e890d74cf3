pub use sea_orm_migration::prelude::*;

pub mod entities;
mod m20260301_000001_adaptive_qrcs;
mod m20260301_000002_visitor_records;
mod m20260301_000003_scan_logs;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_adaptive_qrcs::Migration),
            Box::new(m20260301_000002_visitor_records::Migration),
            Box::new(m20260301_000003_scan_logs::Migration),
        ]
    }
}
