use clap::Parser;
use std::sync::Arc;
use tm::api::ApiClient;
use tm::cli::{
    AiCommand, AliasCommand, CartCommand, Cli, Command, ConfigCommand, CreditsCommand,
    LibraryCommand, LocationCommand, RequestsCommand, SubsCommand, WatchCommand, WebhooksCommand,
    WishlistCommand,
};
use tm::commands::search::SearchParams;
use tm::commands::{account, ai, auth, buy, cart, catalog, market, search, watch};
use tm::error::{ErrorKind, TmError};
use tm::format::{print_error, print_hint};
use tm::store::{FileStore, Session};
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli).await {
        report(&err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), TmError> {
    let store = FileStore::open_default()?;
    let session = Session::new(Arc::new(store)).with_api_override(cli.api);
    let client = ApiClient::new(session)?;

    match cli.command {
        Command::Register {
            email,
            name,
            password,
        } => auth::register(&client, &email, name, password).await,
        Command::Login { email, password } => auth::login(&client, &email, password).await,
        Command::Logout => auth::logout(&client).await,
        Command::Whoami => auth::whoami(&client).await,
        Command::Profile { name, bio, email } => auth::profile(&client, name, bio, email).await,
        Command::Location(command) => match command {
            LocationCommand::Set { city, country } => {
                account::location_set(client.session(), &city, &country)
            }
            LocationCommand::Show => account::location_show(client.session()),
            LocationCommand::Clear => account::location_clear(client.session()),
        },
        Command::Config(command) => match command {
            ConfigCommand::Show => account::config_show(client.session()),
            ConfigCommand::SetApi { url } => account::config_set_api(client.session(), &url),
            ConfigCommand::SetCookieName { name } => {
                account::config_set_cookie_name(client.session(), &name)
            }
            ConfigCommand::Reset => account::config_reset(client.session()),
        },
        Command::Search {
            query,
            category,
            city,
            country,
            price_min,
            price_max,
            limit,
            shape,
        } => {
            let params = SearchParams {
                category,
                city,
                country,
                price_min,
                price_max,
                limit,
            };
            search::search(&client, &query, params, &shape.into()).await
        }
        Command::Products {
            category,
            city,
            country,
            shape,
        } => catalog::products(&client, category, city, country, &shape.into()).await,
        Command::Product { id } => catalog::product(&client, &id).await,
        Command::Sellers {
            city,
            country,
            shape,
        } => catalog::sellers(&client, city, country, &shape.into()).await,
        Command::Seller { id } => catalog::seller(&client, &id).await,
        Command::Reviews { store_id, list } => {
            catalog::reviews(&client, &store_id, &list.into()).await
        }
        Command::Review {
            store_id,
            rating,
            comment,
        } => catalog::review(&client, &store_id, rating, comment).await,
        Command::Buy {
            product,
            offer,
            no_browser,
        } => buy::buy(&client, &product, offer, no_browser).await,
        Command::Cart(command) => match command {
            CartCommand::Show => cart::show(&client).await,
            CartCommand::Add { product, qty } => cart::add(&client, &product, qty).await,
            CartCommand::Remove { item_id } => cart::remove(&client, &item_id).await,
            CartCommand::Checkout => cart::checkout(&client).await,
        },
        Command::Orders { status, list } => cart::orders(&client, status, &list.into()).await,
        Command::Ai(command) => match command {
            AiCommand::Models => ai::models(&client).await,
            AiCommand::Run { model, input } => ai::run(&client, &model, input).await,
            AiCommand::Chat { model } => ai::chat(&client, &model).await,
        },
        Command::Credits { action } => match action {
            None => ai::credits_show(&client).await,
            Some(CreditsCommand::Buy { pack }) => ai::credits_buy(&client, &pack).await,
        },
        Command::Alias(command) => match command {
            AliasCommand::List => account::alias_list(&client).await,
            AliasCommand::Add { name, target } => {
                account::alias_add(&client, &name, &target).await
            }
            AliasCommand::Update { name, target } => {
                account::alias_update(&client, &name, &target).await
            }
            AliasCommand::Rm { name } => account::alias_rm(&client, &name).await,
        },
        Command::Rewards => account::rewards(&client).await,
        Command::Subs(command) => match command {
            SubsCommand::List => account::subs_list(&client).await,
            SubsCommand::Create { product, freq, day } => {
                account::subs_create(&client, &product, &freq, day).await
            }
            SubsCommand::Cancel { id } => account::subs_cancel(&client, &id).await,
        },
        Command::Wishlist(command) => match command {
            WishlistCommand::List => account::wishlist_list(&client).await,
            WishlistCommand::Add { product } => account::wishlist_add(&client, &product).await,
            WishlistCommand::Rm { id } => account::wishlist_rm(&client, &id).await,
        },
        Command::Webhooks(command) => match command {
            WebhooksCommand::List => account::webhooks_list(&client).await,
            WebhooksCommand::Add { url, events } => {
                account::webhooks_add(&client, &url, events).await
            }
            WebhooksCommand::Rm { id } => account::webhooks_rm(&client, &id).await,
        },
        Command::Watch(command) => match command {
            WatchCommand::Create { args } => watch::create(&client, &args).await,
            WatchCommand::List => watch::list(&client).await,
            WatchCommand::Pause { id } => watch::pause(&client, &id).await,
            WatchCommand::Resume { id } => watch::resume(&client, &id).await,
            WatchCommand::Rm { id } => watch::rm(&client, &id).await,
            WatchCommand::Logs { id } => watch::logs(&client, &id).await,
        },
        Command::Requests(command) => match command {
            RequestsCommand::List => market::requests_list(&client).await,
            RequestsCommand::Create {
                title,
                budget,
                description,
            } => market::requests_create(&client, &title, budget, description.as_deref()).await,
            RequestsCommand::Show { id } => market::requests_show(&client, &id).await,
            RequestsCommand::Propose { id, price, message } => {
                market::propose(&client, &id, price, &message).await
            }
        },
        Command::Vacancies { list } => market::vacancies(&client, &list.into()).await,
        Command::Vacancy { id } => market::vacancy(&client, &id).await,
        Command::Apply {
            vacancy_id,
            message,
        } => market::apply(&client, &vacancy_id, message.as_deref()).await,
        Command::Library(command) => match command {
            LibraryCommand::List => market::library_list(&client).await,
            LibraryCommand::Get { id, output } => market::library_get(&client, &id, output).await,
        },
    }
}

/// Render a failure once, with a friendlier line for the two statuses a user
/// can act on directly.
fn report(err: &TmError) {
    match err.kind() {
        ErrorKind::Unauthorized => {
            print_error("Not logged in. Run `tm login <email>` first.");
        }
        ErrorKind::PaymentRequired => {
            print_error(&err.to_string());
            print_hint("Insufficient credits. Buy more with `tm credits buy <pack>`.");
        }
        _ => print_error(&err.to_string()),
    }
}
