//! Dialog content for confirmations.
//!
//! This module renders:
//! - Transaction review screens (deploys and unified transactions)
//! - Message signing confirmation
//!
//! The host turns the component tree into its native dialog.
//!
//! # Security
//!
//! All signing operations MUST show a confirmation screen.
//! The user MUST see what they are signing.

use casper_snap_common::{SnapConfig, SnapError};
use serde::Serialize;

use crate::codec::{parse_hash, AccountHash, PublicKey};
use crate::decoder::DisplayForm;
use crate::platform::DialogHost;
use crate::presentation::{truncate, ConfirmationPayload, ContractTarget, Identifier, PaymentInfo};

/// One dialog element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Component {
    Heading { value: String },
    Text { value: String },
    Copyable { value: String },
    Row { label: String, value: String },
    Link { href: String, value: String, tooltip: String },
    Divider,
    Section { children: Vec<Component> },
}

impl Component {
    pub fn heading(value: impl Into<String>) -> Self {
        Component::Heading { value: value.into() }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Component::Text { value: value.into() }
    }

    pub fn copyable(value: impl Into<String>) -> Self {
        Component::Copyable { value: value.into() }
    }

    pub fn row(label: impl Into<String>, value: impl Into<String>) -> Self {
        Component::Row {
            label: label.into(),
            value: value.into(),
        }
    }

    fn visit<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Component::Heading { value }
            | Component::Text { value }
            | Component::Copyable { value } => out.push(value),
            Component::Row { label, value } => {
                out.push(label);
                out.push(value);
            }
            Component::Link { value, tooltip, .. } => {
                out.push(value);
                out.push(tooltip);
            }
            Component::Divider => {}
            Component::Section { children } => children.iter().for_each(|c| c.visit(out)),
        }
    }
}

/// Full content of a confirmation dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DialogContent {
    pub components: Vec<Component>,
}

impl DialogContent {
    /// Every visible string, depth first.
    pub fn texts(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for c in &self.components {
            c.visit(&mut out);
        }
        out
    }

    /// Returns true if some visible string equals `needle`.
    pub fn shows(&self, needle: &str) -> bool {
        self.texts().contains(&needle)
    }
}

fn link(config: &SnapConfig, id: &Identifier) -> Component {
    Component::Link {
        href: config.explorer_link(&id.search),
        value: id.short.clone(),
        tooltip: id.full.clone(),
    }
}

/// Picks a component for one argument value.
///
/// Account hashes and public keys link to the explorer, bare 32-byte hashes
/// are copyable, anything else is plain text.
fn arg_value(config: &SnapConfig, value: &DisplayForm) -> Component {
    let s = match value {
        DisplayForm::List(_) => return Component::text(value.to_string()),
        DisplayForm::Text(s) => s.as_str(),
    };
    if AccountHash::from_formatted_str(s).is_ok() {
        return link(config, &Identifier::account_hash(s));
    }
    if matches!(PublicKey::from_hex(s), Ok(pk) if pk.curve().is_some()) {
        return link(config, &Identifier::public_key(s));
    }
    if parse_hash(s).is_ok() {
        return Component::copyable(s);
    }
    Component::text(s)
}

fn payment_rows(payment: &PaymentInfo) -> Vec<Component> {
    match payment {
        PaymentInfo::Limited {
            gas_price_tolerance,
            payment_amount,
        } => vec![
            Component::row("Payment Type", "Limited"),
            Component::row("Gas price tolerance", gas_price_tolerance.to_string()),
            Component::row("Payment Amount", payment_amount.clone()),
        ],
        PaymentInfo::Fixed {
            gas_price_tolerance,
            additional_computation_factor,
        } => vec![
            Component::row("Payment Type", "Fixed"),
            Component::row("Gas price tolerance", gas_price_tolerance.to_string()),
            Component::row(
                "Additional Computation Power",
                additional_computation_factor.to_string(),
            ),
        ],
        PaymentInfo::Prepaid { receipt } => vec![
            Component::row("Payment Type", "Prepaid"),
            Component::row("Receipt", receipt.clone()),
        ],
        PaymentInfo::Standard { amount } => vec![
            Component::row("Payment Type", "Standard"),
            Component::row("Amount", amount.clone()),
        ],
        PaymentInfo::Unsupported => vec![Component::row("Payment Type", "Not supported")],
    }
}

fn contract_rows(target: &ContractTarget) -> Vec<Component> {
    match target {
        ContractTarget::Hash(hash) => vec![Component::row("Hash", hash.clone())],
        ContractTarget::Name(name) => vec![Component::row("Name", name.clone())],
        ContractTarget::PackageHash { hash, version } => vec![
            Component::row("Package Hash", hash.clone()),
            Component::row("Package Version", ContractTarget::version_label(*version)),
        ],
        ContractTarget::PackageName { name, version } => vec![
            Component::row("Package Name", name.clone()),
            Component::row("Package Version", ContractTarget::version_label(*version)),
        ],
    }
}

/// Renders the transaction review dialog.
pub fn render_transaction(payload: &ConfirmationPayload, config: &SnapConfig) -> DialogContent {
    let mut components = vec![
        Component::heading(payload.title.clone()),
        Component::text(format!(
            "Review the transaction details requested by {}.",
            payload.origin
        )),
    ];

    let mut details = Vec::new();
    if !payload.args.is_empty() {
        details.push(Component::heading("Arguments"));
        for arg in &payload.args {
            details.push(Component::text(arg.name.clone()));
            details.push(arg_value(config, &arg.value));
        }
    }
    if let Some(call) = &payload.contract {
        details.push(Component::heading("Contract"));
        details.extend(contract_rows(&call.target));
        details.push(Component::row("Entrypoint", call.entry_point.clone()));
    }
    if !details.is_empty() {
        components.push(Component::Section { children: details });
    }

    components.push(Component::Section {
        children: vec![
            Component::text("Signing Key"),
            link(config, &payload.signing_key),
            Component::text("Account"),
            link(config, &payload.initiator),
            Component::text("Transaction Hash"),
            Component::copyable(payload.hash.clone()),
        ],
    });

    let mut summary = vec![
        Component::row("Chain", payload.chain_name.clone()),
        Component::row("Timestamp", payload.timestamp.clone()),
    ];
    if let Some(body_hash) = &payload.body_hash {
        summary.push(Component::row("Body Hash", truncate(body_hash)));
    }
    summary.push(Component::Divider);
    summary.extend(payment_rows(&payload.payment));
    components.push(Component::Section { children: summary });

    DialogContent { components }
}

/// Renders the message signing dialog.
pub fn render_message(origin: &str, signing_key_hex: &str, message: &str) -> DialogContent {
    DialogContent {
        components: vec![
            Component::heading("Sign message"),
            Component::text("Request origin"),
            Component::copyable(origin),
            Component::text("Signing Key"),
            Component::copyable(signing_key_hex),
            Component::text("Message"),
            Component::copyable(message),
        ],
    }
}

/// Shows a dialog and waits for the user's decision.
pub async fn confirm<H: DialogHost + ?Sized>(
    host: &H,
    content: &DialogContent,
) -> Result<bool, SnapError> {
    #[cfg(feature = "autoapprove")]
    {
        log::warn!("snap: auto-approving dialog '{}'", content.texts().first().unwrap_or(&""));
        let _ = host;
        return Ok(true);
    }

    #[cfg(not(feature = "autoapprove"))]
    host.confirm(content).await
}
