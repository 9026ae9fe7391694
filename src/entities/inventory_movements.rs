use sea_orm::entity::prelude::*;

/// Append-only ledger of stock changes and their causes.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "inventory_movements")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub product_id: Option<i32>,

    pub variant_id: Option<i32>,

    /// Positive for additions, negative for removals
    pub change: i32,

    /// "order", "return", "adjustment", "initial"
    pub reason: String,

    /// Order that caused the movement, if any
    pub ref_order_id: Option<i32>,

    pub notes: Option<String>,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::products::Entity",
        from = "Column::ProductId",
        to = "super::products::Column::Id"
    )]
    Product,
    #[sea_orm(
        belongs_to = "super::product_variants::Entity",
        from = "Column::VariantId",
        to = "super::product_variants::Column::Id"
    )]
    Variant,
    #[sea_orm(
        belongs_to = "super::orders::Entity",
        from = "Column::RefOrderId",
        to = "super::orders::Column::Id"
    )]
    Order,
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
