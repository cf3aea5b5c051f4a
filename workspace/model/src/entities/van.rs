use sea_orm::entity::prelude::*;

/// A physical vehicle in the fleet.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "vans")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Plate or fleet number painted on the van.
    #[sea_orm(unique)]
    pub van_number: String,
    /// Accessibility-equipped (lift or ramp).
    #[sea_orm(default_value = "false")]
    pub ada: bool,
    /// The driver currently operating this van. Unique when present.
    #[sea_orm(unique)]
    pub driver_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::DriverId",
        to = "super::user::Column::Id"
    )]
    Driver,
    #[sea_orm(has_many = "super::ride::Entity")]
    Ride,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Driver.def()
    }
}

impl Related<super::ride::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ride.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
