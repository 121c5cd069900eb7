pub use sea_orm_migration::prelude::*;

mod m20210512_000001_create_catalog;
mod m20210512_000002_seed_genres;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20210512_000001_create_catalog::Migration),
            Box::new(m20210512_000002_seed_genres::Migration),
        ]
    }
}
