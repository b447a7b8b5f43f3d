use sea_orm_migration::prelude::*;

use crate::m20260301_000001_acl_schema::{Acl, Resources};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // One resource name per component, tombstoned rows included
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_resources_component_name")
                    .table(Resources::Table)
                    .col(Resources::ComponentId)
                    .col(Resources::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_acl_grant")
                    .table(Acl::Table)
                    .col(Acl::RoleId)
                    .col(Acl::ComponentId)
                    .col(Acl::ResourceId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_acl_grant")
                    .table(Acl::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_resources_component_name")
                    .table(Resources::Table)
                    .to_owned(),
            )
            .await
    }
}
