use std::sync::Arc;

use anyhow::{Context, bail};

use stockroom_client::config::ENV_DATABASE_URL;
use stockroom_client::{ClientConfig, InventoryController, InventoryView};
use stockroom_core::DocumentId;
use stockroom_infra::{DocumentStore, InventoryGateway};
use stockroom_inventory::{CategoryFilter, ItemForm};

const USAGE: &str = "usage: stockroom [list [CATEGORY] | add NAME QUANTITY PRICE CATEGORY | delete ID]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ClientConfig::from_env().context("invalid configuration")?;
    stockroom_observability::init_with(config.log_format);

    let store = config
        .backend
        .open()
        .await
        .context("failed to open document store")?;
    let gateway = InventoryGateway::new(store, config.collection.clone());
    let mut controller = InventoryController::new(gateway, config.low_stock_threshold);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = run(&mut controller, &args, config.backend.is_persistent()).await;
    controller.close().await;
    result
}

async fn run(
    controller: &mut InventoryController<Arc<dyn DocumentStore>>,
    args: &[String],
    persistent: bool,
) -> anyhow::Result<()> {
    let command = args.first().map(String::as_str);
    if !persistent && matches!(command, Some("add" | "delete")) {
        tracing::warn!(
            "{ENV_DATABASE_URL} is not set to a sqlite: URL; changes are lost when the process exits"
        );
    }

    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        [] | ["list"] => list(controller, CategoryFilter::All).await,
        ["list", category] => list(controller, CategoryFilter::from_selection(category)).await,
        ["add", name, quantity, price, category] => {
            let id = controller
                .add_item(&ItemForm::new(*name, *quantity, *price, *category))
                .await
                .context("failed to add item")?;
            println!("{id}");
            Ok(())
        }
        ["delete", id] => {
            let id: DocumentId = id.parse().context("invalid item id")?;
            controller
                .delete_item(&id)
                .await
                .context("failed to delete item")?;
            Ok(())
        }
        _ => bail!(USAGE),
    }
}

async fn list(
    controller: &mut InventoryController<Arc<dyn DocumentStore>>,
    filter: CategoryFilter,
) -> anyhow::Result<()> {
    controller.select_category(filter);
    controller.open().await.context("failed to subscribe to inventory")?;
    let view = controller
        .wait_for(|view| view.loaded)
        .await
        .context("inventory view closed before loading")?;

    print_view(&view);
    Ok(())
}

fn print_view(view: &InventoryView) {
    for record in &view.visible {
        let id = record.id.as_ref().map(DocumentId::as_str).unwrap_or("-");
        println!(
            "{id}\t{}\t{}\t{:.2}\t{}",
            record.name, record.quantity, record.price, record.category
        );
    }

    let stats = &view.statistics;
    tracing::info!(
        filter = %view.filter,
        unique = stats.unique_count,
        total_value = stats.total_value,
        low_stock = stats.low_stock.len(),
        out_of_stock = stats.out_of_stock.len(),
        rejected = view.rejected,
        "inventory summary"
    );
}
