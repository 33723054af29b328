// End-to-end flow against a file-backed database:
// import a catalog, record purchases, search, report, share.

use chrono::NaiveDate;
use tint_shop::import::read_catalog;
use tint_shop::{
    compute_report, import_catalog, search_by_color, search_by_customer, share_purchase, CustomerData,
    CustomerType, PaintData, PersistenceGateway, PurchaseData, SqliteGateway,
};

const CATALOG: &str = "\
color_name,product_type,base_size,base_unit,description,component_name,quantity,unit
Ocean Blue,QD Enamel,5,litre,,White Base,3.5,litre
Ocean Blue,QD Enamel,5,litre,,Blue Tint,1.0,litre
Ocean Blue,QD Enamel,5,litre,,Black,0.5,litre
Sunset Orange,DTM,4,litre,,Red Oxide,0.4,litre
Sunset Orange,DTM,4,litre,,Yellow Oxide,0.2,litre
";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_full_shop_flow_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("shop.db");

    let (maria, ocean, sale) = {
        let gateway = SqliteGateway::open(&db_path).unwrap();

        let drafts = read_catalog(CATALOG.as_bytes()).unwrap();
        let summary = import_catalog(&gateway, &drafts).unwrap();
        assert_eq!(summary.created.len(), 2);

        let ocean = summary.created[0];
        let sunset = summary.created[1];
        let maria = gateway
            .create_customer(&CustomerData::new("Maria Lopez", CustomerType::Individual).with_phone("555-0101"))
            .unwrap();
        let brightwall = gateway
            .create_customer(&CustomerData::new("Brightwall Painters", CustomerType::Company))
            .unwrap();

        let sale = gateway
            .create_purchase(&PurchaseData::new(maria, ocean, 12.5, "litre", date(2025, 5, 2)))
            .unwrap();
        gateway
            .create_purchase(&PurchaseData::new(brightwall, sunset, 20.0, "litre", date(2025, 5, 3)))
            .unwrap();
        gateway
            .create_purchase(&PurchaseData::new(brightwall, sunset, 8.0, "litre", date(2025, 6, 1)))
            .unwrap();

        (maria, ocean, sale)
    };

    // Reopen: everything above must have been committed
    let gateway = SqliteGateway::open(&db_path).unwrap();

    let found = search_by_customer(&gateway, "lopez").unwrap();
    assert_eq!(found.customer.as_ref().map(|c| c.id), Some(maria));
    let scaled = &found.purchases[0].formulation;
    let quantities: Vec<f64> = scaled.components.iter().map(|c| c.quantity).collect();
    assert_eq!(quantities, vec![8.75, 2.5, 1.25]);
    assert_eq!(scaled.total, 12.5);

    let color = search_by_color(&gateway, "SUNSET").unwrap();
    assert_eq!(color.customers.len(), 2);
    assert!(color.customers.iter().all(|c| c.customer_type == CustomerType::Company));

    let report = compute_report(&gateway.snapshot().unwrap(), date(2025, 6, 15));
    assert_eq!(report.total_customers, 2);
    assert_eq!(report.total_paints, 2);
    assert_eq!(report.total_purchases, 3);
    assert_eq!(report.popular_colors[0].color_name, "Sunset Orange");
    assert_eq!(report.popular_colors[0].total_volume, 28.0);
    assert_eq!(report.active_customers[0].name, "Brightwall Painters");

    let message = share_purchase(&gateway, sale).unwrap();
    assert!(message.contains("Paint: Ocean Blue\n"));
    assert!(message.ends_with("Total: 12.500 litre"));

    // Replace Ocean Blue's formulation, then delete Maria with her purchase
    gateway
        .update_paint(
            ocean,
            &PaintData::new("Ocean Blue", "QD Enamel", 5.0, "litre"),
            &[tint_shop::ComponentData::new("Blue Tint", 2.0, "litre", 0)],
        )
        .unwrap();
    assert_eq!(gateway.formulation_for_paint(ocean).unwrap().len(), 1);

    assert_eq!(gateway.delete_customer(maria).unwrap(), 1);
    assert!(search_by_customer(&gateway, "maria").unwrap().customer.is_none());
    assert_eq!(gateway.list_purchases().unwrap().len(), 2);
}

#[test]
fn test_reimporting_catalog_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = SqliteGateway::open(&dir.path().join("shop.db")).unwrap();
    let drafts = read_catalog(CATALOG.as_bytes()).unwrap();

    import_catalog(&gateway, &drafts).unwrap();
    let second = import_catalog(&gateway, &drafts).unwrap();

    assert!(second.created.is_empty());
    assert_eq!(second.skipped.len(), 2);
    assert_eq!(gateway.list_paints().unwrap().len(), 2);
}
