use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Genres::Table)
                    .if_not_exists()
                    .col(pk_auto(Genres::Id))
                    .col(string(Genres::Name))
                    .col(string_null(Genres::Description))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Movies::Table)
                    .if_not_exists()
                    .col(pk_auto(Movies::Id))
                    .col(string(Movies::Title))
                    .col(string(Movies::Director))
                    .col(string(Movies::ReleaseDate))
                    .col(big_integer(Movies::GrossCents))
                    .col(double(Movies::Rating))
                    .col(integer(Movies::GenreId))
                    .col(blob(Movies::RowVersion))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movies_genre_id")
                            .from(Movies::Table, Movies::GenreId)
                            .to(Genres::Table, Genres::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movies_genre_id")
                    .table(Movies::Table)
                    .col(Movies::GenreId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Actors::Table)
                    .if_not_exists()
                    .col(pk_auto(Actors::Id))
                    .col(string(Actors::Name))
                    .col(string(Actors::BirthDate))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Characters::Table)
                    .if_not_exists()
                    .col(pk_auto(Characters::Id))
                    .col(integer(Characters::ActorId))
                    .col(integer(Characters::MovieId))
                    .col(string(Characters::Character))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_characters_actor_id")
                            .from(Characters::Table, Characters::ActorId)
                            .to(Actors::Table, Actors::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_characters_movie_id")
                            .from(Characters::Table, Characters::MovieId)
                            .to(Movies::Table, Movies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_characters_actor_id")
                    .table(Characters::Table)
                    .col(Characters::ActorId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_characters_movie_id")
                    .table(Characters::Table)
                    .col(Characters::MovieId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Characters::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Actors::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Movies::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Genres::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Genres {
    Table,
    Id,
    Name,
    Description,
}

#[derive(DeriveIden)]
enum Movies {
    Table,
    Id,
    Title,
    Director,
    ReleaseDate,
    GrossCents,
    Rating,
    GenreId,
    RowVersion,
}

#[derive(DeriveIden)]
enum Actors {
    Table,
    Id,
    Name,
    BirthDate,
}

#[derive(DeriveIden)]
enum Characters {
    Table,
    Id,
    ActorId,
    MovieId,
    Character,
}
