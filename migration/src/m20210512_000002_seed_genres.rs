use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const DEFAULT_GENRES: &[(&str, &str)] = &[
    ("Action", "Chases, fights and explosions"),
    ("Comedy", "Made to make you laugh"),
    ("Drama", "Character-driven stories"),
    ("Horror", "Made to scare"),
    ("Science Fiction", "Speculative technology and futures"),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut insert = Query::insert();
        insert.into_table(Genres::Table).columns([Genres::Name, Genres::Description]);
        for (name, description) in DEFAULT_GENRES {
            insert
                .values([(*name).into(), (*description).into()])
                .map_err(|e| DbErr::Custom(e.to_string()))?;
        }
        manager.exec_stmt(insert).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let names = DEFAULT_GENRES.iter().map(|(name, _)| *name);
        manager
            .exec_stmt(
                Query::delete()
                    .from_table(Genres::Table)
                    .and_where(Expr::col(Genres::Name).is_in(names))
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Genres {
    Table,
    Name,
    Description,
}
