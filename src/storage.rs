use crate::entities;
use crate::errors::StoreError;
use crate::settings::Database as DbCfg;
use crate::store::{AclGrant, Component, EntityStore, Resource, Role};
use async_trait::async_trait;
use migration::{Migrator, MigratorTrait};
use sea_orm::ActiveValue::Unchanged;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

/// Connect and bring the schema up to date.
pub async fn init(cfg: &DbCfg) -> Result<DatabaseConnection, StoreError> {
    let db = Database::connect(&cfg.url).await?;
    Migrator::up(&db, None).await?;
    tracing::info!("Database schema is up to date");
    Ok(db)
}

/// [`EntityStore`] backed by a sea-orm connection (SQLite or PostgreSQL).
#[derive(Debug, Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl From<entities::role::Model> for Role {
    fn from(model: entities::role::Model) -> Self {
        Role {
            id: model.id,
            name: model.name,
            description: model.description,
        }
    }
}

impl From<entities::component::Model> for Component {
    fn from(model: entities::component::Model) -> Self {
        Component {
            id: model.id,
            name: model.name,
            description: model.description,
            removed_at: model.removed_at,
        }
    }
}

impl From<entities::resource::Model> for Resource {
    fn from(model: entities::resource::Model) -> Self {
        Resource {
            id: model.id,
            component_id: model.component_id,
            name: model.name,
            api_alias: model.api_alias,
            removed_at: model.removed_at,
        }
    }
}

impl From<entities::acl::Model> for AclGrant {
    fn from(model: entities::acl::Model) -> Self {
        AclGrant {
            id: model.id,
            role_id: model.role_id,
            component_id: model.component_id,
            resource_id: model.resource_id,
        }
    }
}

#[async_trait]
impl EntityStore for SeaOrmStore {
    async fn roles(&self) -> Result<Vec<Role>, StoreError> {
        use entities::role::{Column, Entity};

        let models = Entity::find()
            .order_by_asc(Column::Name)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Role::from).collect())
    }

    async fn find_role(&self, name: &str) -> Result<Option<Role>, StoreError> {
        use entities::role::{Column, Entity};

        Ok(Entity::find()
            .filter(Column::Name.eq(name))
            .one(&self.db)
            .await?
            .map(Role::from))
    }

    async fn create_role(
        &self,
        name: &str,
        description: Option<String>,
    ) -> Result<Role, StoreError> {
        let role = entities::role::ActiveModel {
            id: Default::default(),
            name: Set(name.to_string()),
            description: Set(description),
        };
        Ok(role.insert(&self.db).await?.into())
    }

    async fn components(&self) -> Result<Vec<Component>, StoreError> {
        use entities::component::{Column, Entity};

        let models = Entity::find()
            .order_by_asc(Column::Name)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Component::from).collect())
    }

    async fn find_component(&self, name: &str) -> Result<Option<Component>, StoreError> {
        use entities::component::{Column, Entity};

        Ok(Entity::find()
            .filter(Column::Name.eq(name))
            .one(&self.db)
            .await?
            .map(Component::from))
    }

    async fn create_component(
        &self,
        name: &str,
        description: Option<String>,
    ) -> Result<Component, StoreError> {
        let component = entities::component::ActiveModel {
            id: Default::default(),
            name: Set(name.to_string()),
            description: Set(description),
            removed_at: Set(None),
        };
        Ok(component.insert(&self.db).await?.into())
    }

    async fn update_component(&self, component: &Component) -> Result<(), StoreError> {
        let active = entities::component::ActiveModel {
            id: Unchanged(component.id),
            name: Set(component.name.clone()),
            description: Set(component.description.clone()),
            removed_at: Set(component.removed_at),
        };
        active.update(&self.db).await?;
        Ok(())
    }

    async fn resources(&self, component_id: i64) -> Result<Vec<Resource>, StoreError> {
        use entities::resource::{Column, Entity};

        let models = Entity::find()
            .filter(Column::ComponentId.eq(component_id))
            .order_by_asc(Column::Name)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Resource::from).collect())
    }

    async fn find_resource(
        &self,
        component_id: i64,
        name: &str,
    ) -> Result<Option<Resource>, StoreError> {
        use entities::resource::{Column, Entity};

        Ok(Entity::find()
            .filter(Column::ComponentId.eq(component_id))
            .filter(Column::Name.eq(name))
            .one(&self.db)
            .await?
            .map(Resource::from))
    }

    async fn create_resource(
        &self,
        component_id: i64,
        name: &str,
        api_alias: Option<String>,
    ) -> Result<Resource, StoreError> {
        let resource = entities::resource::ActiveModel {
            id: Default::default(),
            component_id: Set(component_id),
            name: Set(name.to_string()),
            api_alias: Set(api_alias),
            removed_at: Set(None),
        };
        Ok(resource.insert(&self.db).await?.into())
    }

    async fn update_resource(&self, resource: &Resource) -> Result<(), StoreError> {
        let active = entities::resource::ActiveModel {
            id: Unchanged(resource.id),
            component_id: Set(resource.component_id),
            name: Set(resource.name.clone()),
            api_alias: Set(resource.api_alias.clone()),
            removed_at: Set(resource.removed_at),
        };
        active.update(&self.db).await?;
        Ok(())
    }

    async fn grants(&self) -> Result<Vec<AclGrant>, StoreError> {
        use entities::acl::{Column, Entity};

        let models = Entity::find()
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(AclGrant::from).collect())
    }

    async fn create_grant(
        &self,
        role_id: i64,
        component_id: i64,
        resource_id: i64,
    ) -> Result<AclGrant, StoreError> {
        let grant = entities::acl::ActiveModel {
            id: Default::default(),
            role_id: Set(role_id),
            component_id: Set(component_id),
            resource_id: Set(resource_id),
        };
        Ok(grant.insert(&self.db).await?.into())
    }
}
