use crate::calendar::Scheduled;
use crate::format::{
    mask_document, mask_phone, parse_brl_amount, validate_document, validate_phone,
    validate_present, ValidationError,
};
use crate::theme::status::{CANCELLED_STYLE, DONE_STYLE, IN_PROGRESS_STYLE, OPEN_STYLE, WAITING_STYLE};
use ratatui::style::Style;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::Date;

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub(crate) enum OrderStatus {
    #[serde(rename = "ABERTA")]
    Open,
    #[serde(rename = "EM_ANDAMENTO")]
    InProgress,
    #[serde(rename = "AGUARDANDO_PECA")]
    AwaitingPart,
    #[serde(rename = "AGUARDANDO_APROVACAO")]
    AwaitingApproval,
    #[serde(rename = "CONCLUIDA")]
    Completed,
    #[serde(rename = "CANCELADA")]
    Cancelled,
    /// A status this client does not know about
    #[default]
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    pub(crate) fn style(self) -> Style {
        match self {
            OrderStatus::Open => OPEN_STYLE,
            OrderStatus::InProgress => IN_PROGRESS_STYLE,
            OrderStatus::AwaitingPart | OrderStatus::AwaitingApproval => WAITING_STYLE,
            OrderStatus::Completed => DONE_STYLE,
            OrderStatus::Cancelled => CANCELLED_STYLE,
            OrderStatus::Unknown => Style::new(),
        }
    }
}

/// Accepts the backend's names in any case, with spaces or dashes in place of
/// underscores
impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<OrderStatus, ValidationError> {
        match s.trim().to_ascii_uppercase().replace([' ', '-'], "_").as_str() {
            "ABERTA" => Ok(OrderStatus::Open),
            "EM_ANDAMENTO" => Ok(OrderStatus::InProgress),
            "AGUARDANDO_PECA" => Ok(OrderStatus::AwaitingPart),
            "AGUARDANDO_APROVACAO" => Ok(OrderStatus::AwaitingApproval),
            "CONCLUIDA" => Ok(OrderStatus::Completed),
            "CANCELADA" => Ok(OrderStatus::Cancelled),
            _ => Err(ValidationError::Status(s.to_owned())),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OrderStatus::Open => "Aberta",
            OrderStatus::InProgress => "Em andamento",
            OrderStatus::AwaitingPart => "Aguardando peça",
            OrderStatus::AwaitingApproval => "Aguardando aprovação",
            OrderStatus::Completed => "Concluída",
            OrderStatus::Cancelled => "Cancelada",
            OrderStatus::Unknown => "Desconhecido",
        };
        f.pad(label)
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub(crate) struct ServiceOrder {
    pub(crate) id: i64,
    #[serde(rename = "numero")]
    pub(crate) number: String,
    #[serde(rename = "nomeCliente")]
    pub(crate) client_name: String,
    #[serde(rename = "documentoCliente")]
    pub(crate) client_document: String,
    #[serde(rename = "telefoneCliente")]
    pub(crate) client_phone: String,
    #[serde(rename = "enderecoCliente")]
    pub(crate) client_address: String,
    #[serde(rename = "dataAbertura")]
    pub(crate) opened_at: Option<String>,
    #[serde(rename = "dataFechamento")]
    pub(crate) closed_at: Option<String>,
    #[serde(rename = "dataPrevisaoEntrega", skip_serializing_if = "Option::is_none")]
    pub(crate) delivery_forecast: Option<String>,
    pub(crate) status: OrderStatus,
    #[serde(rename = "descricaoProblema")]
    pub(crate) problem: String,
    #[serde(rename = "solucao")]
    pub(crate) solution: Option<String>,
    #[serde(rename = "valorTotal")]
    pub(crate) total: Option<f64>,
    #[serde(rename = "equipamento")]
    pub(crate) equipment: String,
    #[serde(rename = "marca")]
    pub(crate) brand: String,
    #[serde(rename = "modelo")]
    pub(crate) model: String,
    #[serde(rename = "numeroSerie")]
    pub(crate) serial_number: String,
    #[serde(rename = "equipamentosUsados")]
    pub(crate) used_equipment: Vec<UsedEquipment>,
}

impl ServiceOrder {
    /// The update that moves this order to `status`, leaving everything else
    /// as it is
    pub(crate) fn with_status(&self, status: OrderStatus) -> OrderUpdate<'_> {
        OrderUpdate {
            client_name: &self.client_name,
            client_document: &self.client_document,
            client_phone: &self.client_phone,
            client_address: &self.client_address,
            problem: &self.problem,
            equipment: &self.equipment,
            brand: &self.brand,
            model: &self.model,
            serial_number: &self.serial_number,
            status,
            solution: self.solution.as_deref(),
            total: self.total,
            used_equipment: &self.used_equipment,
        }
    }
}

impl Scheduled for ServiceOrder {
    fn delivery_date(&self) -> Option<Date> {
        self.delivery_forecast
            .as_deref()
            .and_then(crate::format::parse_timestamp)
            .map(|dt| dt.date())
    }

    fn label(&self) -> &str {
        &self.client_name
    }

    fn style(&self) -> Style {
        self.status.style()
    }
}

/// Body for opening a service order
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub(crate) struct OrderInput {
    #[serde(rename = "nomeCliente")]
    pub(crate) client_name: String,
    #[serde(rename = "documentoCliente")]
    pub(crate) client_document: String,
    #[serde(rename = "telefoneCliente")]
    pub(crate) client_phone: String,
    #[serde(rename = "enderecoCliente")]
    pub(crate) client_address: String,
    #[serde(rename = "equipamento")]
    pub(crate) equipment: String,
    #[serde(rename = "descricaoProblema")]
    pub(crate) problem: String,
    /// The user taking charge of the order
    #[serde(rename = "responsavelId")]
    pub(crate) responsible_id: i64,
    #[serde(rename = "marca", skip_serializing_if = "Option::is_none")]
    pub(crate) brand: Option<String>,
    #[serde(rename = "modelo", skip_serializing_if = "Option::is_none")]
    pub(crate) model: Option<String>,
    #[serde(rename = "numeroSerie", skip_serializing_if = "Option::is_none")]
    pub(crate) serial_number: Option<String>,
}

impl OrderInput {
    /// Checks the client fields the way [`ClientInput::validated`] does, and
    /// requires an equipment and problem description
    pub(crate) fn validated(self) -> Result<OrderInput, ValidationError> {
        let client = ClientInput {
            document: self.client_document,
            name: self.client_name,
            contact: self.client_phone,
            address: self.client_address,
        }
        .validated()?;
        validate_present("equipment", &self.equipment)?;
        validate_present("problem", &self.problem)?;
        let optional = |s: Option<String>| {
            s.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
        };
        Ok(OrderInput {
            client_name: client.name,
            client_document: client.document,
            client_phone: client.contact,
            client_address: client.address,
            equipment: self.equipment.trim().to_owned(),
            problem: self.problem.trim().to_owned(),
            responsible_id: self.responsible_id,
            brand: optional(self.brand),
            model: optional(self.model),
            serial_number: optional(self.serial_number),
        })
    }
}

/// Body for updating a service order.  The backend overwrites every field
/// with what it is sent, so this is built from the order as last fetched.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct OrderUpdate<'a> {
    #[serde(rename = "nomeCliente")]
    client_name: &'a str,
    #[serde(rename = "documentoCliente")]
    client_document: &'a str,
    #[serde(rename = "telefoneCliente")]
    client_phone: &'a str,
    #[serde(rename = "enderecoCliente")]
    client_address: &'a str,
    #[serde(rename = "descricaoProblema")]
    problem: &'a str,
    #[serde(rename = "equipamento")]
    equipment: &'a str,
    #[serde(rename = "marca")]
    brand: &'a str,
    #[serde(rename = "modelo")]
    model: &'a str,
    #[serde(rename = "numeroSerie")]
    serial_number: &'a str,
    status: OrderStatus,
    #[serde(rename = "solucao")]
    solution: Option<&'a str>,
    #[serde(rename = "valorTotal")]
    total: Option<f64>,
    #[serde(rename = "equipamentosUsados")]
    used_equipment: &'a [UsedEquipment],
}

/// A part or piece of equipment billed on a service order
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub(crate) struct UsedEquipment {
    #[serde(rename = "produtoId", alias = "id", skip_serializing_if = "Option::is_none")]
    pub(crate) product_id: Option<i64>,
    #[serde(rename = "nome")]
    pub(crate) name: String,
    #[serde(rename = "quantidade")]
    pub(crate) quantity: i64,
    #[serde(rename = "valorUnitario", alias = "precoUnitario")]
    pub(crate) unit_price: f64,
    #[serde(rename = "valorTotal", alias = "precoTotal")]
    pub(crate) total_price: f64,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub(crate) struct Client {
    pub(crate) id: i64,
    /// CPF or CNPJ
    #[serde(rename = "documento")]
    pub(crate) document: String,
    /// Person's name or company name
    #[serde(rename = "nome")]
    pub(crate) name: String,
    #[serde(rename = "contato")]
    pub(crate) contact: String,
    #[serde(rename = "endereco")]
    pub(crate) address: String,
}

/// Body for creating or updating a client
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub(crate) struct ClientInput {
    #[serde(rename = "documento")]
    pub(crate) document: String,
    #[serde(rename = "nome")]
    pub(crate) name: String,
    #[serde(rename = "contato")]
    pub(crate) contact: String,
    #[serde(rename = "endereco")]
    pub(crate) address: String,
}

impl ClientInput {
    /// Checks the fields and applies the document and phone masks, as the
    /// client form does before submitting
    pub(crate) fn validated(self) -> Result<ClientInput, ValidationError> {
        validate_present("name", &self.name)?;
        validate_document(&self.document)?;
        validate_phone(&self.contact)?;
        validate_present("address", &self.address)?;
        Ok(ClientInput {
            document: mask_document(&self.document),
            name: self.name.trim().to_owned(),
            contact: mask_phone(&self.contact),
            address: self.address.trim().to_owned(),
        })
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub(crate) struct Product {
    pub(crate) id: i64,
    #[serde(rename = "nome")]
    pub(crate) name: String,
    #[serde(rename = "descricao")]
    pub(crate) description: Option<String>,
    #[serde(rename = "preco")]
    pub(crate) price: f64,
    #[serde(rename = "quantidadeEstoque", alias = "quantidade")]
    pub(crate) stock: i64,
    #[serde(rename = "unidadeMedida")]
    pub(crate) unit: Option<String>,
    #[serde(rename = "categoria")]
    pub(crate) category: Option<String>,
}

/// Body for creating a product
#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct ProductInput {
    #[serde(rename = "nome")]
    pub(crate) name: String,
    #[serde(rename = "descricao")]
    pub(crate) description: String,
    #[serde(rename = "preco")]
    pub(crate) price: f64,
    #[serde(rename = "quantidadeEstoque")]
    pub(crate) stock: u32,
    #[serde(rename = "unidadeMedida")]
    pub(crate) unit: String,
    #[serde(rename = "categoria")]
    pub(crate) category: String,
}

impl ProductInput {
    /// `amount` is currency input as accepted by [`parse_brl_amount`]
    pub(crate) fn new(
        name: &str,
        description: &str,
        amount: &str,
        stock: u32,
        unit: &str,
        category: &str,
    ) -> Result<ProductInput, ValidationError> {
        validate_present("name", name)?;
        validate_present("description", description)?;
        validate_present("unit", unit)?;
        validate_present("category", category)?;
        Ok(ProductInput {
            name: name.trim().to_owned(),
            description: description.trim().to_owned(),
            price: parse_brl_amount(amount)?,
            stock,
            unit: unit.trim().to_owned(),
            category: category.trim().to_owned(),
        })
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub(crate) struct Service {
    pub(crate) id: i64,
    #[serde(rename = "nome")]
    pub(crate) name: String,
    #[serde(rename = "descricao")]
    pub(crate) description: Option<String>,
    #[serde(rename = "valor")]
    pub(crate) price: f64,
    /// Estimated duration in minutes
    #[serde(rename = "tempoEstimado")]
    pub(crate) estimated_minutes: Option<i64>,
}

/// Body for creating a service
#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct ServiceInput {
    #[serde(rename = "nome")]
    pub(crate) name: String,
    #[serde(rename = "descricao")]
    pub(crate) description: String,
    #[serde(rename = "valor")]
    pub(crate) price: f64,
    #[serde(rename = "tempoEstimado")]
    pub(crate) estimated_minutes: u32,
}

impl ServiceInput {
    pub(crate) fn new(
        name: &str,
        description: &str,
        amount: &str,
        estimated_minutes: u32,
    ) -> Result<ServiceInput, ValidationError> {
        validate_present("name", name)?;
        validate_present("description", description)?;
        let price = parse_brl_amount(amount)?;
        if price <= 0.0 {
            return Err(ValidationError::NotPositive("price"));
        }
        if estimated_minutes == 0 {
            return Err(ValidationError::NotPositive("estimated time"));
        }
        Ok(ServiceInput {
            name: name.trim().to_owned(),
            description: description.trim().to_owned(),
            price,
            estimated_minutes,
        })
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub(crate) enum UserKind {
    #[serde(rename = "ADMIN")]
    Admin,
    #[serde(rename = "OPERADOR")]
    Operator,
}

impl fmt::Display for UserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserKind::Admin => f.pad("administrator"),
            UserKind::Operator => f.pad("operator"),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub(crate) struct User {
    pub(crate) id: i64,
    #[serde(rename = "nome")]
    pub(crate) name: String,
    pub(crate) email: String,
    #[serde(rename = "tipo", alias = "tipoUsuario")]
    pub(crate) kind: UserKind,
    #[serde(default, rename = "telefone", skip_serializing_if = "Option::is_none")]
    pub(crate) phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) avatar: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct DashboardStats {
    pub(crate) total_ordens_abertas: u64,
    pub(crate) total_ordens_em_andamento: u64,
    pub(crate) total_ordens_concluidas: u64,
    pub(crate) total_ordens_canceladas: u64,
    pub(crate) faturamento_total: f64,
    pub(crate) ticket_medio: f64,
    pub(crate) produtos_baixo_estoque: u64,
}

/// One page of a paginated listing
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Page<T> {
    #[serde(default = "Vec::new")]
    pub(crate) content: Vec<T>,
    #[serde(default)]
    pub(crate) total_elements: u64,
    #[serde(default)]
    pub(crate) total_pages: u32,
    #[serde(default)]
    pub(crate) size: u32,
    /// Zero-based page index
    #[serde(default)]
    pub(crate) number: u32,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub(crate) email: &'a str,
    #[serde(rename = "senha")]
    pub(crate) password: &'a str,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub(crate) struct TokenResponse {
    pub(crate) token: String,
    #[serde(default, rename = "tipo")]
    pub(crate) token_type: Option<String>,
    pub(crate) id: i64,
    #[serde(rename = "nome")]
    pub(crate) name: String,
    pub(crate) email: String,
    #[serde(rename = "tipoUsuario")]
    pub(crate) kind: UserKind,
    #[serde(default)]
    pub(crate) avatar: Option<String>,
}

impl TokenResponse {
    pub(crate) fn user(&self) -> User {
        User {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            kind: self.kind,
            phone: None,
            avatar: self.avatar.clone(),
        }
    }
}
