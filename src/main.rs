mod api;
mod app;
mod calendar;
mod config;
mod format;
mod help;
mod inventory;
mod jumpto;
mod models;
mod session;
mod storage;
mod theme;
use crate::api::Resource;
use crate::app::{App, Outcome};
use crate::calendar::{Clock, MonthCursor, SystemClock};
use crate::config::Config;
use crate::format::{format_brl, format_timestamp, parse_brl_amount, YMD_FMT};
use crate::inventory::StockSummary;
use crate::models::{
    Client, ClientInput, OrderInput, OrderStatus, Product, ProductInput, Service, ServiceInput,
    ServiceOrder, User,
};
use crate::session::Session;
use crate::storage::{FileStorage, Storage};
use anyhow::{bail, Context};
use lexopt::{Arg, Parser, ValueExt};
use ratatui::DefaultTerminal;
use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use time::Date;
use tracing_subscriber::EnvFilter;

const PASSWORD_VAR: &str = "OSAGENDA_PASSWORD";

/// Options that belong to a single command rather than to the program
#[derive(Clone, Debug, Default, Eq, PartialEq)]
struct CommandOptions {
    page: Option<u32>,
    brand: Option<String>,
    model: Option<String>,
    serial: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
struct Cli {
    server: Option<String>,
    log_file: Option<PathBuf>,
    command: Command,
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum Command {
    Agenda { month: Option<Date> },
    Login { email: String },
    Logout,
    Whoami,
    /// `page` is one-based
    Orders { page: u32 },
    Order { id: i64 },
    Stock,
    Dashboard,
    List { resource: Resource },
    AddClient(ClientInput),
    /// `responsible_id` is filled in with the logged-in user's
    NewOrder(OrderInput),
    OrderStatus { id: i64, status: OrderStatus },
    NewService {
        name: String,
        description: String,
        amount: String,
        minutes: u32,
    },
    NewProduct {
        name: String,
        description: String,
        amount: String,
        stock: u32,
        unit: String,
        category: String,
    },
    Delete { resource: Resource, id: i64 },
    SetPrice { id: i64, amount: String },
    Pdf { id: i64, output: PathBuf },
    Help,
    Version,
}

impl Cli {
    fn from_parser(mut parser: Parser) -> Result<Cli, lexopt::Error> {
        let mut server = None;
        let mut log_file = None;
        let mut options = CommandOptions::default();
        let mut words = Vec::new();
        while let Some(arg) = parser.next()? {
            match arg {
                Arg::Short('h') | Arg::Long("help") => {
                    return Ok(Cli {
                        server,
                        log_file,
                        command: Command::Help,
                    })
                }
                Arg::Short('V') | Arg::Long("version") => {
                    return Ok(Cli {
                        server,
                        log_file,
                        command: Command::Version,
                    })
                }
                Arg::Long("server") => server = Some(parser.value()?.string()?),
                Arg::Long("log-file") => log_file = Some(PathBuf::from(parser.value()?)),
                Arg::Long("page") => options.page = Some(parser.value()?.parse::<u32>()?),
                Arg::Long("brand") => options.brand = Some(parser.value()?.string()?),
                Arg::Long("model") => options.model = Some(parser.value()?.string()?),
                Arg::Long("serial") => options.serial = Some(parser.value()?.string()?),
                Arg::Value(value) => words.push(value.string()?),
                _ => return Err(arg.unexpected()),
            }
        }
        let command = Command::from_words(words, options)?;
        Ok(Cli {
            server,
            log_file,
            command,
        })
    }

    fn run(self, clock: SystemClock) -> anyhow::Result<()> {
        match self.command {
            Command::Help => {
                print_usage();
                return Ok(());
            }
            Command::Version => {
                println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            _ => (),
        }
        let interactive = matches!(self.command, Command::Agenda { .. });
        init_logging(self.log_file.as_deref(), interactive)?;
        let config = Config::resolve(self.server)?;
        tracing::debug!(api_url = %config.api_url, state_dir = %config.state_dir.display(), "resolved configuration");
        let storage = FileStorage::new(&config.state_dir);
        let client = api::ApiClient::new(&config.api_url, storage)?;
        let session = Session::restore(client).context("failed to read saved session")?;
        self.command.execute(session, clock)
    }
}

impl Command {
    fn from_words(words: Vec<String>, options: CommandOptions) -> Result<Command, lexopt::Error> {
        let CommandOptions {
            page,
            brand,
            model,
            serial,
        } = options;
        if words.first().map(String::as_str) != Some("new-order") {
            for (option, value) in [("--brand", &brand), ("--model", &model), ("--serial", &serial)] {
                if value.is_some() {
                    return Err(lexopt::Error::UnexpectedOption(String::from(option)));
                }
            }
        }
        let mut words = words.into_iter();
        let Some(name) = words.next() else {
            return Ok(Command::Agenda { month: None });
        };
        let command = match name.as_str() {
            "agenda" => Command::Agenda {
                month: words.next().map(|m| parse_month(&m)).transpose()?,
            },
            "login" => Command::Login {
                email: required(&mut words, "email")?,
            },
            "logout" => Command::Logout,
            "whoami" => Command::Whoami,
            "orders" => match page {
                Some(0) => return Err(custom("page numbers start at 1")),
                Some(page) => Command::Orders { page },
                None => Command::Orders { page: 1 },
            },
            "order" => Command::Order {
                id: parse_id(&mut words)?,
            },
            "stock" => Command::Stock,
            "dashboard" => Command::Dashboard,
            "list" => Command::List {
                resource: parse_resource(&mut words, "list")?,
            },
            "add-client" => Command::AddClient(ClientInput {
                document: required(&mut words, "document")?,
                name: required(&mut words, "name")?,
                contact: required(&mut words, "phone")?,
                address: required(&mut words, "address")?,
            }),
            "new-order" => Command::NewOrder(OrderInput {
                client_document: required(&mut words, "document")?,
                client_name: required(&mut words, "name")?,
                client_phone: required(&mut words, "phone")?,
                client_address: required(&mut words, "address")?,
                equipment: required(&mut words, "equipment")?,
                problem: required(&mut words, "problem")?,
                responsible_id: 0,
                brand,
                model,
                serial_number: serial,
            }),
            "order-status" => {
                let id = parse_id(&mut words)?;
                let value = required(&mut words, "status")?;
                let status = value.parse::<OrderStatus>().map_err(|e| lexopt::Error::ParsingFailed {
                    value,
                    error: Box::new(e),
                })?;
                Command::OrderStatus { id, status }
            }
            "new-service" => Command::NewService {
                name: required(&mut words, "name")?,
                description: required(&mut words, "description")?,
                amount: required(&mut words, "amount")?,
                minutes: parse_count(&mut words, "minutes")?,
            },
            "new-product" => Command::NewProduct {
                name: required(&mut words, "name")?,
                description: required(&mut words, "description")?,
                amount: required(&mut words, "amount")?,
                stock: parse_count(&mut words, "stock")?,
                unit: required(&mut words, "unit")?,
                category: required(&mut words, "category")?,
            },
            "delete" => Command::Delete {
                resource: parse_resource(&mut words, "delete")?,
                id: parse_id(&mut words)?,
            },
            "set-price" => Command::SetPrice {
                id: parse_id(&mut words)?,
                amount: required(&mut words, "amount")?,
            },
            "pdf" => Command::Pdf {
                id: parse_id(&mut words)?,
                output: PathBuf::from(required(&mut words, "output-file")?),
            },
            // A bare month is shorthand for `agenda YYYY-MM`
            other => match parse_month(other) {
                Ok(month) => Command::Agenda { month: Some(month) },
                Err(_) => return Err(custom(&format!("unknown command {other:?}"))),
            },
        };
        if let Some(extra) = words.next() {
            return Err(lexopt::Error::UnexpectedArgument(extra.into()));
        }
        if page.is_some() && !matches!(command, Command::Orders { .. }) {
            return Err(lexopt::Error::UnexpectedOption(String::from("--page")));
        }
        Ok(command)
    }

    fn execute<S: Storage>(self, mut session: Session<S>, clock: SystemClock) -> anyhow::Result<()> {
        if let Command::Login { email } = &self {
            let password = read_password()?;
            let user = session.login(email, &password)?;
            println!("Logged in as {} ({})", user.name, user.kind);
            return Ok(());
        }
        if self == Command::Logout {
            let was_logged_in = session.is_authenticated();
            session.logout().context("failed to clear saved session")?;
            if was_logged_in {
                println!("Logged out");
            } else {
                println!("Not logged in");
            }
            return Ok(());
        }
        let user = session.ensure_authenticated()?;
        let client = session.client();
        match self {
            Command::Agenda { month } => {
                let orders = client
                    .all_service_orders()
                    .context("failed to load service orders")?;
                let mut cursor = MonthCursor::new(clock.today());
                if let Some(month) = month {
                    cursor = cursor.start_month(month);
                }
                let outcome = with_terminal(|mut terminal| {
                    terminal.hide_cursor().context("failed to hide cursor")?;
                    Ok(App::new(session, clock, cursor, orders).run(&mut terminal)?)
                })?;
                if outcome == Outcome::SessionExpired {
                    bail!("session expired; log in again with `{} login <email>`", env!("CARGO_PKG_NAME"));
                }
            }
            Command::Whoami => print_user(user),
            Command::Orders { page } => {
                let page = client
                    .service_orders_page(page - 1)
                    .context("failed to load service orders")?;
                for order in &page.content {
                    println!(
                        "{:>6}  {:<14} {:<22} {:<24} {}",
                        order.id,
                        order.number,
                        order.status,
                        order.client_name,
                        format_timestamp(order.delivery_forecast.as_deref()),
                    );
                }
                println!(
                    "Page {} of {} ({} service orders)",
                    page.number + 1,
                    page.total_pages.max(1),
                    page.total_elements
                );
            }
            Command::Order { id } => {
                let order: ServiceOrder = client
                    .fetch(Resource::ServiceOrders, id)
                    .with_context(|| format!("failed to fetch service order {id}"))?;
                print_order(&order);
            }
            Command::Stock => {
                let products: Vec<Product> = client
                    .list(Resource::Products)
                    .context("failed to load products")?;
                print!("{}", StockSummary::from_products(&products));
            }
            Command::Dashboard => {
                let stats = client
                    .dashboard_stats()
                    .context("failed to load dashboard statistics")?;
                println!("Open:          {}", stats.total_ordens_abertas);
                println!("In progress:   {}", stats.total_ordens_em_andamento);
                println!("Completed:     {}", stats.total_ordens_concluidas);
                println!("Cancelled:     {}", stats.total_ordens_canceladas);
                println!("Revenue:       {}", format_brl(stats.faturamento_total));
                println!("Average order: {}", format_brl(stats.ticket_medio));
                println!("Low stock:     {}", stats.produtos_baixo_estoque);
            }
            Command::List { resource } => list(client, resource)?,
            Command::AddClient(input) => {
                let input = input.validated()?;
                let created: Client = client
                    .create(Resource::Clients, &input)
                    .context("failed to create client")?;
                println!("Created client #{} {} ({})", created.id, created.name, created.document);
            }
            Command::NewOrder(input) => {
                let input = OrderInput {
                    responsible_id: user.id,
                    ..input
                }
                .validated()?;
                let created: ServiceOrder = client
                    .create(Resource::ServiceOrders, &input)
                    .context("failed to create service order")?;
                println!("Opened service order {} (#{})", created.number, created.id);
            }
            Command::OrderStatus { id, status } => {
                let order: ServiceOrder = client
                    .fetch(Resource::ServiceOrders, id)
                    .with_context(|| format!("failed to fetch service order {id}"))?;
                let updated: ServiceOrder = client
                    .update(Resource::ServiceOrders, id, &order.with_status(status))
                    .with_context(|| format!("failed to update service order {id}"))?;
                println!("Service order {} is now {}", updated.number, updated.status);
            }
            Command::NewService {
                name,
                description,
                amount,
                minutes,
            } => {
                let input = ServiceInput::new(&name, &description, &amount, minutes)?;
                let created: Service = client
                    .create(Resource::Services, &input)
                    .context("failed to create service")?;
                println!("Created service #{} {} ({})", created.id, created.name, format_brl(created.price));
            }
            Command::NewProduct {
                name,
                description,
                amount,
                stock,
                unit,
                category,
            } => {
                let input = ProductInput::new(&name, &description, &amount, stock, &unit, &category)?;
                let created: Product = client
                    .create(Resource::Products, &input)
                    .context("failed to create product")?;
                println!("Created product #{} {} ({})", created.id, created.name, format_brl(created.price));
            }
            Command::Delete { resource, id } => {
                let noun = resource_noun(resource);
                client
                    .delete(resource, id)
                    .with_context(|| format!("failed to delete {noun} {id}"))?;
                println!("Deleted {noun} #{id}");
            }
            Command::SetPrice { id, amount } => {
                let price = parse_brl_amount(&amount)?;
                let mut product: Product = client
                    .fetch(Resource::Products, id)
                    .with_context(|| format!("failed to fetch product {id}"))?;
                product.price = price;
                let updated: Product = client
                    .update(Resource::Products, id, &product)
                    .with_context(|| format!("failed to update product {id}"))?;
                println!("{} now costs {}", updated.name, format_brl(updated.price));
            }
            Command::Pdf { id, output } => {
                let pdf = client
                    .service_order_pdf(id)
                    .with_context(|| format!("failed to download PDF for service order {id}"))?;
                fs::write(&output, pdf)
                    .with_context(|| format!("failed to write {}", output.display()))?;
                println!("Saved service order {id} to {}", output.display());
            }
            Command::Login { .. } | Command::Logout | Command::Help | Command::Version => (),
        }
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    // Must run before anything spawns threads, or the local offset is
    // unavailable
    let clock = SystemClock::detect();
    Cli::from_parser(Parser::from_env())?.run(clock)
}

fn with_terminal<F, T>(func: F) -> anyhow::Result<T>
where
    F: FnOnce(DefaultTerminal) -> anyhow::Result<T>,
{
    let terminal = ratatui::init();
    let r = func(terminal);
    ratatui::restore();
    r
}

fn init_logging(log_file: Option<&Path>, interactive: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        // Anything written to the terminal would corrupt the agenda's screen
        None if interactive => builder.with_writer(io::sink).init(),
        None => builder.with_writer(io::stderr).init(),
    }
    Ok(())
}

fn read_password() -> anyhow::Result<String> {
    if let Ok(password) = std::env::var(PASSWORD_VAR) {
        return Ok(password);
    }
    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read password")?;
    let password = line.trim_end_matches(['\r', '\n']).to_owned();
    if password.is_empty() {
        bail!("no password given");
    }
    Ok(password)
}

fn list<S: Storage>(client: &api::ApiClient<S>, resource: Resource) -> anyhow::Result<()> {
    let context = "failed to load listing";
    match resource {
        Resource::Clients => {
            for c in client.list::<Client>(resource).context(context)? {
                println!("{:>6}  {:<20} {:<30} {:<16} {}", c.id, c.document, c.name, c.contact, c.address);
            }
        }
        Resource::Products => {
            for p in client.list::<Product>(resource).context(context)? {
                println!("{:>6}  {:<30} {:>14} {:>6}", p.id, p.name, format_brl(p.price), p.stock);
            }
        }
        Resource::Services => {
            for s in client.list::<Service>(resource).context(context)? {
                let minutes = s.estimated_minutes.map_or_else(|| String::from("-"), |m| format!("{m} min"));
                println!("{:>6}  {:<30} {:>14} {:>8}", s.id, s.name, format_brl(s.price), minutes);
            }
        }
        Resource::Users => {
            for u in client.list::<User>(resource).context(context)? {
                println!("{:>6}  {:<30} {:<30} {}", u.id, u.name, u.email, u.kind);
            }
        }
        Resource::ServiceOrders => {
            for o in client.all_service_orders().context(context)? {
                println!("{:>6}  {:<14} {:<22} {}", o.id, o.number, o.status, o.client_name);
            }
        }
    }
    Ok(())
}

fn print_user(user: &User) {
    println!("{} <{}>", user.name, user.email);
    println!("Role:  {}", user.kind);
    if let Some(phone) = &user.phone {
        println!("Phone: {phone}");
    }
}

fn print_order(order: &ServiceOrder) {
    println!("Service order {} (#{})", order.number, order.id);
    println!("Status:     {}", order.status);
    println!("Client:     {} ({})", order.client_name, order.client_document);
    println!("Phone:      {}", order.client_phone);
    println!("Address:    {}", order.client_address);
    println!("Equipment:  {} {} {} {}", order.equipment, order.brand, order.model, order.serial_number);
    println!("Problem:    {}", order.problem);
    if let Some(solution) = &order.solution {
        println!("Solution:   {solution}");
    }
    println!("Opened:     {}", format_timestamp(order.opened_at.as_deref()));
    println!("Due:        {}", format_timestamp(order.delivery_forecast.as_deref()));
    println!("Closed:     {}", format_timestamp(order.closed_at.as_deref()));
    for item in &order.used_equipment {
        println!(
            "  {:>4} x {:<30} {:>14} {:>14}",
            item.quantity,
            item.name,
            format_brl(item.unit_price),
            format_brl(item.total_price)
        );
    }
    if let Some(total) = order.total {
        println!("Total:      {}", format_brl(total));
    }
}

fn print_usage() {
    let name = env!("CARGO_PKG_NAME");
    println!("Usage: {name} [options] [command]");
    println!();
    println!("Terminal agenda and client for the SistemaOS service-order backend");
    println!();
    println!("Commands:");
    println!("  agenda [YYYY-MM]        Browse service orders by delivery date (default)");
    println!("  login <email>           Log in; the password is read from {PASSWORD_VAR} or stdin");
    println!("  logout                  Forget the saved login");
    println!("  whoami                  Show the logged-in user");
    println!("  orders [--page N]       List one page of service orders");
    println!("  order <id>              Show one service order");
    println!("  stock                   Summarize stock levels");
    println!("  dashboard               Show service-order statistics");
    println!("  list <kind>             List clients, products, services, or users");
    println!("  add-client <document> <name> <phone> <address>");
    println!("                          Register a client");
    println!("  new-order <document> <name> <phone> <address> <equipment> <problem>");
    println!("        [--brand B] [--model M] [--serial S]");
    println!("                          Open a service order assigned to yourself");
    println!("  order-status <id> <status>");
    println!("                          Move a service order to ABERTA, EM_ANDAMENTO,");
    println!("                          AGUARDANDO_PECA, AGUARDANDO_APROVACAO, CONCLUIDA,");
    println!("                          or CANCELADA");
    println!("  new-service <name> <description> <amount> <minutes>");
    println!("                          Register a service");
    println!("  new-product <name> <description> <amount> <stock> <unit> <category>");
    println!("                          Register a product");
    println!("  delete <kind> <id>      Remove a client, product, service, or user");
    println!("  set-price <id> <amount> Change a product's price");
    println!("  pdf <id> <output-file>  Download a service order as PDF");
    println!();
    println!("Options:");
    println!("  --server <url>          Backend address [env: OSAGENDA_API_URL]");
    println!("  --log-file <path>       Append log messages to this file");
    println!("  -h, --help              Display this help message and exit");
    println!("  -V, --version           Show the program version and exit");
}

fn parse_month(value: &str) -> Result<Date, lexopt::Error> {
    Date::parse(&format!("{value}-01"), &YMD_FMT).map_err(|e| lexopt::Error::ParsingFailed {
        value: value.to_owned(),
        error: Box::new(e),
    })
}

fn parse_id(words: &mut impl Iterator<Item = String>) -> Result<i64, lexopt::Error> {
    let value = required(words, "id")?;
    value.parse::<i64>().map_err(|e| lexopt::Error::ParsingFailed {
        value,
        error: Box::new(e),
    })
}

fn parse_count(words: &mut impl Iterator<Item = String>, what: &str) -> Result<u32, lexopt::Error> {
    let value = required(words, what)?;
    value.parse::<u32>().map_err(|e| lexopt::Error::ParsingFailed {
        value,
        error: Box::new(e),
    })
}

fn parse_resource(
    words: &mut impl Iterator<Item = String>,
    verb: &str,
) -> Result<Resource, lexopt::Error> {
    match required(words, "kind")?.as_str() {
        "client" | "clients" => Ok(Resource::Clients),
        "product" | "products" => Ok(Resource::Products),
        "service" | "services" => Ok(Resource::Services),
        "user" | "users" => Ok(Resource::Users),
        other => Err(custom(&format!(
            "cannot {verb} {other:?}; expected clients, products, services, or users"
        ))),
    }
}

fn resource_noun(resource: Resource) -> &'static str {
    match resource {
        Resource::Clients => "client",
        Resource::Products => "product",
        Resource::Services => "service",
        Resource::Users => "user",
        Resource::ServiceOrders => "service order",
    }
}

fn required(words: &mut impl Iterator<Item = String>, what: &str) -> Result<String, lexopt::Error> {
    words
        .next()
        .ok_or_else(|| custom(&format!("missing <{what}> argument")))
}

fn custom(msg: &str) -> lexopt::Error {
    lexopt::Error::Custom(msg.into())
}
