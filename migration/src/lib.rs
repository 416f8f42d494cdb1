pub use sea_orm_migration::prelude::*;

mod m20240101_000001_init;
mod m20240102_000002_enrollments_and_tickets;
mod m20240103_000003_hotels_and_rooms;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_init::Migration),
            Box::new(m20240102_000002_enrollments_and_tickets::Migration),
            Box::new(m20240103_000003_hotels_and_rooms::Migration),
        ]
    }
}
