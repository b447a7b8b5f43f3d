use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Enable foreign keys for SQLite
        if manager.get_database_backend() == sea_orm::DatabaseBackend::Sqlite {
            manager
                .get_connection()
                .execute_unprepared("PRAGMA foreign_keys = ON")
                .await?;
        }

        manager
            .create_table(
                Table::create()
                    .table(Roles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Roles::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Roles::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(string_null(Roles::Description))
                    .to_owned(),
            )
            .await?;

        // Components are never hard-deleted: removed_at is the tombstone
        manager
            .create_table(
                Table::create()
                    .table(Components::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Components::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Components::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(string_null(Components::Description))
                    .col(big_integer_null(Components::RemovedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Resources::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Resources::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(big_integer(Resources::ComponentId))
                    .col(string(Resources::Name))
                    .col(string_null(Resources::ApiAlias))
                    .col(big_integer_null(Resources::RemovedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_resources_component")
                            .from(Resources::Table, Resources::ComponentId)
                            .to(Components::Table, Components::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Acl::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Acl::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(big_integer(Acl::RoleId))
                    .col(big_integer(Acl::ComponentId))
                    .col(big_integer(Acl::ResourceId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_acl_role")
                            .from(Acl::Table, Acl::RoleId)
                            .to(Roles::Table, Roles::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_acl_component")
                            .from(Acl::Table, Acl::ComponentId)
                            .to(Components::Table, Components::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_acl_resource")
                            .from(Acl::Table, Acl::ResourceId)
                            .to(Resources::Table, Resources::Id),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Acl::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Resources::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Components::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Roles::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Roles {
    Table,
    Id,
    Name,
    Description,
}

#[derive(DeriveIden)]
pub(crate) enum Components {
    Table,
    Id,
    Name,
    Description,
    RemovedAt,
}

#[derive(DeriveIden)]
pub(crate) enum Resources {
    Table,
    Id,
    ComponentId,
    Name,
    ApiAlias,
    RemovedAt,
}

#[derive(DeriveIden)]
pub(crate) enum Acl {
    Table,
    Id,
    RoleId,
    ComponentId,
    ResourceId,
}
