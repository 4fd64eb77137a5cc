use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use std::sync::Arc;

use locascan::auth::SessionSource;
use locascan::controller::LoginForm;
use locascan::device::{Devices, GeoFix};
use locascan::error::{Error, Result};
use locascan::models::{Coordinates, LocationIcon, ProductScan, StorageLocation};
use locascan::preferences::JsonFileSettings;
use locascan::LocaScan;

fn cli() -> Command<'static> {
    let lat = Arg::new("lat")
        .long("lat")
        .takes_value(true)
        .allow_hyphen_values(true)
        .value_parser(value_parser!(f64))
        .requires("lon")
        .help("Latitude in decimal degrees");
    let lon = Arg::new("lon")
        .long("lon")
        .takes_value(true)
        .allow_hyphen_values(true)
        .value_parser(value_parser!(f64))
        .requires("lat")
        .help("Longitude in decimal degrees");

    Command::new("locascan")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Inventory scans and storage locations")
        .subcommand_required(true)
        .arg(
            Arg::new("settings")
                .long("settings")
                .value_name("FILE")
                .takes_value(true)
                .default_value("locascan-settings.json")
                .help("Settings and session file"),
        )
        .subcommand(
            Command::new("login")
                .about("Sign in with e-mail and password")
                .arg(Arg::new("email").required(true))
                .arg(
                    Arg::new("password")
                        .long("password")
                        .takes_value(true)
                        .help("Password, defaults to LOCASCAN_PASSWORD"),
                ),
        )
        .subcommand(Command::new("logout").about("Forget the stored session"))
        .subcommand(Command::new("whoami").about("Show the signed-in user"))
        .subcommand(
            Command::new("scans")
                .about("Product scans")
                .subcommand_required(true)
                .subcommand(
                    Command::new("list").arg(
                        Arg::new("location")
                            .long("location")
                            .takes_value(true)
                            .help("Only products at this location id"),
                    ),
                )
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("barcode").required(true))
                        .arg(Arg::new("name").long("name").takes_value(true).required(true))
                        .arg(Arg::new("quantity").long("quantity").takes_value(true))
                        .arg(Arg::new("location").long("location").takes_value(true))
                        .arg(lat.clone())
                        .arg(lon.clone()),
                )
                .subcommand(
                    Command::new("search")
                        .arg(Arg::new("text").required(true))
                        .arg(
                            Arg::new("by-name")
                                .long("by-name")
                                .action(ArgAction::SetTrue)
                                .help("Match product names instead of barcodes"),
                        ),
                )
                .subcommand(Command::new("delete").arg(Arg::new("id").required(true))),
        )
        .subcommand(
            Command::new("locations")
                .about("Storage locations")
                .subcommand_required(true)
                .subcommand(Command::new("list"))
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").required(true))
                        .arg(Arg::new("description").long("description").takes_value(true))
                        .arg(Arg::new("address").long("address").takes_value(true))
                        .arg(
                            Arg::new("icon")
                                .long("icon")
                                .takes_value(true)
                                .value_parser(value_parser!(LocationIcon))
                                .help("pin, warehouse, store, home or package"),
                        )
                        .arg(lat)
                        .arg(lon),
                )
                .subcommand(
                    Command::new("delete")
                        .arg(Arg::new("id").required(true))
                        .arg(
                            Arg::new("yes")
                                .long("yes")
                                .action(ArgAction::SetTrue)
                                .help("Skip the confirmation"),
                        ),
                ),
        )
        .subcommand(
            Command::new("settings")
                .about("Local settings")
                .subcommand_required(true)
                .subcommand(Command::new("show"))
                .subcommand(Command::new("reset").about("Restore appearance settings"))
                .subcommand(Command::new("clear").about("Erase all local data")),
        )
}

fn text<'a>(matches: &'a ArgMatches, name: &str) -> Option<&'a str> {
    matches.get_one::<String>(name).map(String::as_str)
}

fn flag(matches: &ArgMatches, name: &str) -> bool {
    matches.get_one::<bool>(name).copied().unwrap_or(false)
}

fn coordinates(matches: &ArgMatches) -> Option<Coordinates> {
    let lat = matches.get_one::<f64>("lat")?;
    let lon = matches.get_one::<f64>("lon")?;
    Some(Coordinates::new(*lat, *lon))
}

fn devices_at(position: Option<Coordinates>) -> Devices {
    match position {
        Some(coordinates) => Devices::headless_at(GeoFix::from(coordinates)),
        None => Devices::headless(),
    }
}

fn print_scan(scan: &ProductScan) {
    println!(
        "{}  {}  {} x{}  {}  {}",
        scan.id.as_deref().unwrap_or("-"),
        scan.scan_date.format("%Y-%m-%d %H:%M"),
        scan.barcode,
        scan.quantity,
        scan.product_name,
        scan.location_label(),
    );
}

fn print_location(location: &StorageLocation) {
    let position = location
        .coordinates()
        .map(|c| format!("{:.4}", c))
        .unwrap_or_else(|| "no coordinates".to_string());
    println!(
        "{}  {}  {} product(s)  {}",
        location.id.as_deref().unwrap_or("-"),
        location.label(),
        location.product_count,
        position,
    );
}

async fn require_session(client: &LocaScan) -> Result<()> {
    match client.sessions().current_session().await {
        Some(_) => Ok(()),
        None => Err(Error::Unauthenticated),
    }
}

async fn scans(client: &LocaScan, matches: &ArgMatches) -> Result<()> {
    require_session(client).await?;
    let products = client.product_scans();

    match matches.subcommand() {
        Some(("list", sub)) => {
            let list = match text(sub, "location") {
                Some(location) => products.list_by_location(location).await,
                None => products.try_list_all().await?,
            };
            list.iter().for_each(print_scan);
        }
        Some(("add", sub)) => {
            let mut page = client.inventory(devices_at(coordinates(sub)));
            page.on_appearing().await;

            let form = page.form_mut();
            form.barcode = text(sub, "barcode").unwrap_or_default().to_string();
            form.product_name = text(sub, "name").unwrap_or_default().to_string();
            if let Some(quantity) = text(sub, "quantity") {
                form.quantity = quantity.to_string();
            }
            if let Some(location) = text(sub, "location") {
                if !page.select_location(Some(location)) {
                    return Err(Error::not_found(format!("location {}", location)));
                }
            }

            let outcome = page.submit().await?;
            println!("saved {}", outcome.id());
        }
        Some(("search", sub)) => {
            let needle = text(sub, "text").unwrap_or_default();
            let found = if flag(sub, "by-name") {
                products.search_by_name(needle).await
            } else {
                products.search_by_barcode(needle).await
            };
            found.iter().for_each(print_scan);
        }
        Some(("delete", sub)) => {
            let id = text(sub, "id").unwrap_or_default();
            if !products.delete(id).await {
                return Err(Error::remote_write(format!("could not delete {}", id)));
            }
            println!("deleted {}", id);
        }
        _ => unreachable!("subcommand required"),
    }
    Ok(())
}

async fn locations(client: &LocaScan, matches: &ArgMatches) -> Result<()> {
    require_session(client).await?;

    match matches.subcommand() {
        Some(("list", _)) => {
            for location in client.locations().list_with_counts().await {
                print_location(&location);
            }
        }
        Some(("add", sub)) => {
            let position = coordinates(sub);
            let mut page = client.locations_page(devices_at(position));
            if position.is_some() {
                page.acquire_coordinates().await?;
            }

            let form = page.form_mut();
            form.name = text(sub, "name").unwrap_or_default().to_string();
            form.description = text(sub, "description").unwrap_or_default().to_string();
            form.address = text(sub, "address").unwrap_or_default().to_string();
            if let Some(icon) = sub.get_one::<LocationIcon>("icon") {
                page.select_icon(*icon);
            }

            let outcome = page.submit().await?;
            println!("saved {}", outcome.id());
        }
        Some(("delete", sub)) => {
            let id = text(sub, "id").unwrap_or_default();
            let mut page = client.locations_page(Devices::headless());
            page.on_appearing().await;
            let location = page
                .locations()
                .iter()
                .find(|location| location.id.as_deref() == Some(id))
                .cloned()
                .ok_or_else(|| Error::not_found(format!("location {}", id)))?;

            let prompt = page.delete_prompt(&location);
            if !flag(sub, "yes") {
                println!("{}\n{}\n\nRun again with --yes to delete.", prompt.title, prompt.message);
                return Ok(());
            }
            page.delete(&location).await?;
            println!("deleted {}", id);
        }
        _ => unreachable!("subcommand required"),
    }
    Ok(())
}

fn settings(client: &LocaScan, matches: &ArgMatches) {
    let preferences = client.preferences();
    match matches.subcommand() {
        Some(("show", _)) => {
            let summary = preferences.summary();
            println!("user:          {} {}", summary.user_name, summary.user_email);
            println!("dark mode:     {}", summary.dark_mode);
            println!("scans:         {}", summary.scan_count);
            match summary.last_sync {
                Some(when) => println!("last sync:     {}", when.format("%Y-%m-%d %H:%M:%S")),
                None => println!("last sync:     never"),
            }
            match summary.last_location {
                Some(position) => println!("last position: {}", position),
                None => println!("last position: none"),
            }
        }
        Some(("reset", _)) => {
            preferences.reset_appearance();
            println!("appearance settings restored");
        }
        Some(("clear", _)) => {
            preferences.clear_all();
            println!("local data erased");
        }
        _ => unreachable!("subcommand required"),
    }
}

async fn run(matches: ArgMatches) -> Result<()> {
    let path = matches
        .get_one::<String>("settings")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("locascan-settings.json"));
    let store = Arc::new(JsonFileSettings::open(&path)?);
    let client = LocaScan::from_env()?.with_settings(store);

    match matches.subcommand() {
        Some(("login", sub)) => {
            let password = match text(sub, "password") {
                Some(password) => password.to_string(),
                None => std::env::var("LOCASCAN_PASSWORD").unwrap_or_default(),
            };
            let form = LoginForm::new(text(sub, "email").unwrap_or_default(), &password);
            let user = client.session_gate().login(&form).await?;
            println!("signed in as {} ({})", user.display_name_or_default(), user.uid);
        }
        Some(("logout", _)) => {
            client.session_gate().logout().await?;
            println!("signed out");
        }
        Some(("whoami", _)) => match client.sessions().current_user().await {
            Some(user) => println!(
                "{} <{}> {}",
                user.display_name_or_default(),
                user.email.as_deref().unwrap_or(""),
                user.uid
            ),
            None => println!("not signed in"),
        },
        Some(("scans", sub)) => scans(&client, sub).await?,
        Some(("locations", sub)) => locations(&client, sub).await?,
        Some(("settings", sub)) => settings(&client, sub),
        _ => unreachable!("subcommand required"),
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    pretty_env_logger::init();

    if let Err(e) = run(cli().get_matches()).await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
