use crate::support::{action, object, opt_str, require_str, unsupported, SeededStore};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use weavecore::{IntegrationAdapter, IntegrationResult, JsonMap};

const SOURCE: &str = "crm-store";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Contact {
    id: String,
    name: String,
    email: String,
    company: String,
    status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Deal {
    id: String,
    title: String,
    amount: f64,
    stage: String,
    contact_id: String,
}

struct CrmState {
    contacts: Vec<Contact>,
    deals: Vec<Deal>,
    next_contact: u32,
    next_deal: u32,
}

fn seed() -> CrmState {
    let contact = |id: &str, name: &str, email: &str, company: &str, status: &str| Contact {
        id: id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        company: company.to_string(),
        status: status.to_string(),
    };
    let deal = |id: &str, title: &str, amount: f64, stage: &str, contact_id: &str| Deal {
        id: id.to_string(),
        title: title.to_string(),
        amount,
        stage: stage.to_string(),
        contact_id: contact_id.to_string(),
    };
    CrmState {
        contacts: vec![
            contact("contact-1", "Alice Chen", "alice@acme.example", "Acme Corp", "customer"),
            contact("contact-2", "Ben Ortiz", "ben@globex.example", "Globex", "lead"),
            contact("contact-3", "Clara Novak", "clara@initech.example", "Initech", "customer"),
            contact("contact-4", "Dev Patel", "dev@umbrella.example", "Umbrella", "prospect"),
        ],
        deals: vec![
            deal("deal-1", "Acme annual renewal", 24000.0, "negotiation", "contact-1"),
            deal("deal-2", "Globex pilot", 5000.0, "qualification", "contact-2"),
            deal("deal-3", "Initech expansion", 48000.0, "proposal", "contact-3"),
        ],
        next_contact: 5,
        next_deal: 4,
    }
}

enum CrmAction {
    ListContacts,
    AddContact,
    UpdateContact,
    SearchContacts,
    ListDeals,
    AddDeal,
}

/// CRM contacts and deals over a seeded local store
pub struct CrmAdapter {
    store: SeededStore<CrmState>,
}

impl CrmAdapter {
    pub fn new() -> Self {
        Self {
            store: SeededStore::new(),
        }
    }
}

impl Default for CrmAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IntegrationAdapter for CrmAdapter {
    fn id(&self) -> &str {
        "crm"
    }

    fn name(&self) -> &str {
        "CRM"
    }

    fn description(&self) -> &str {
        "Manage contacts and deals"
    }

    fn category(&self) -> &str {
        "sales"
    }

    fn keywords(&self) -> &[&str] {
        &["crm", "contact", "customer", "lead", "deal", "pipeline", "sales"]
    }

    async fn execute(&self, input: JsonMap) -> IntegrationResult {
        let parsed = match action(&input).unwrap_or("list-contacts") {
            "list-contacts" => CrmAction::ListContacts,
            "add-contact" => CrmAction::AddContact,
            "update-contact" => CrmAction::UpdateContact,
            "search-contacts" => CrmAction::SearchContacts,
            "list-deals" => CrmAction::ListDeals,
            "add-deal" => CrmAction::AddDeal,
            other => return unsupported(SOURCE, other),
        };

        self.store.with(seed, |state| match parsed {
            CrmAction::ListContacts => IntegrationResult::ok(
                SOURCE,
                object(json!({ "contacts": state.contacts, "count": state.contacts.len() })),
            ),
            CrmAction::AddContact => {
                let name = match require_str(&input, "name") {
                    Ok(name) => name,
                    Err(reason) => return IntegrationResult::fail(SOURCE, reason),
                };
                let contact = Contact {
                    id: format!("contact-{}", state.next_contact),
                    name: name.to_string(),
                    email: opt_str(&input, "email").unwrap_or("").to_string(),
                    company: opt_str(&input, "company").unwrap_or("").to_string(),
                    status: opt_str(&input, "status").unwrap_or("lead").to_string(),
                };
                state.next_contact += 1;
                state.contacts.push(contact.clone());
                IntegrationResult::ok(SOURCE, object(json!({ "contact": contact })))
            }
            CrmAction::UpdateContact => {
                let id = match require_str(&input, "id") {
                    Ok(id) => id,
                    Err(reason) => return IntegrationResult::fail(SOURCE, reason),
                };
                let Some(contact) = state.contacts.iter_mut().find(|c| c.id == id) else {
                    return IntegrationResult::fail(SOURCE, "Contact not found");
                };
                if let Some(name) = opt_str(&input, "name") {
                    contact.name = name.to_string();
                }
                if let Some(email) = opt_str(&input, "email") {
                    contact.email = email.to_string();
                }
                if let Some(status) = opt_str(&input, "status") {
                    contact.status = status.to_string();
                }
                IntegrationResult::ok(SOURCE, object(json!({ "contact": contact.clone() })))
            }
            CrmAction::SearchContacts => {
                let query = match require_str(&input, "query") {
                    Ok(query) => query.to_lowercase(),
                    Err(reason) => return IntegrationResult::fail(SOURCE, reason),
                };
                let matches: Vec<&Contact> = state
                    .contacts
                    .iter()
                    .filter(|c| {
                        c.name.to_lowercase().contains(&query)
                            || c.company.to_lowercase().contains(&query)
                            || c.email.to_lowercase().contains(&query)
                    })
                    .collect();
                IntegrationResult::ok(
                    SOURCE,
                    object(json!({ "contacts": matches, "count": matches.len() })),
                )
            }
            CrmAction::ListDeals => IntegrationResult::ok(
                SOURCE,
                object(json!({ "deals": state.deals, "count": state.deals.len() })),
            ),
            CrmAction::AddDeal => {
                let title = match require_str(&input, "title") {
                    Ok(title) => title,
                    Err(reason) => return IntegrationResult::fail(SOURCE, reason),
                };
                let deal = Deal {
                    id: format!("deal-{}", state.next_deal),
                    title: title.to_string(),
                    amount: input.get("amount").and_then(|v| v.as_f64()).unwrap_or(0.0),
                    stage: opt_str(&input, "stage").unwrap_or("qualification").to_string(),
                    contact_id: opt_str(&input, "contactId").unwrap_or("").to_string(),
                };
                state.next_deal += 1;
                state.deals.push(deal.clone());
                IntegrationResult::ok(SOURCE, object(json!({ "deal": deal })))
            }
        })
    }
}
