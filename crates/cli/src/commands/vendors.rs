//! `quartermaster vendors`: look up offers in the vendor catalog.

use std::path::Path;
use quartermaster_tools::{JsonVendorCatalog, VendorCatalog};

pub async fn run(config_path: Option<&Path>, product: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let catalog = JsonVendorCatalog::new(&config.vendors.catalog_path);

    let mut offers = catalog.search(product).await?;
    if offers.is_empty() {
        println!("No vendors found for \"{product}\" in {}", catalog.path().display());
        return Ok(());
    }

    offers.sort_by(|a, b| a.price.total_cmp(&b.price));
    println!("{:<20} {:<28} {:>10}", "VENDOR", "PRODUCT", "PRICE");
    for offer in &offers {
        println!("{:<20} {:<28} {:>10.2}", offer.vendor, offer.product, offer.price);
    }
    Ok(())
}
