use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "product_variants")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub product_id: i32,

    #[sea_orm(unique)]
    pub sku: Option<String>,

    /// Display name, e.g. "Red / Large"
    pub name: String,

    /// JSON-encoded attribute map, e.g. {"color": "Red", "size": "Large"}
    pub attributes: Option<String>,

    /// Overrides the parent product's price when set
    #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
    pub price_override: Option<Decimal>,

    pub stock: i32,

    pub is_active: bool,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::products::Entity",
        from = "Column::ProductId",
        to = "super::products::Column::Id"
    )]
    Product,
    #[sea_orm(has_many = "super::product_images::Entity")]
    Images,
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::product_images::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Images.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
