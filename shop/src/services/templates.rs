// petalcart/src/services/templates.rs

//! Fixed HTML bodies for the shop's emails. Anything that came from a request
//! goes through [`escape_html`].

use crate::models::{DeliveryDetails, LineItem, OrderNotification};
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedEmail {
  pub subject: String,
  pub html: String,
}

pub fn escape_html(raw: &str) -> String {
  let mut out = String::with_capacity(raw.len());
  for c in raw.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      _ => out.push(c),
    }
  }
  out
}

/// Whole-unit amount with a currency symbol, e.g. `₹1,500`.
pub fn format_amount(amount: i64, currency: &str) -> String {
  let digits = amount.unsigned_abs().to_string();
  let mut grouped = String::new();
  for (i, c) in digits.chars().enumerate() {
    if i > 0 && (digits.len() - i) % 3 == 0 {
      grouped.push(',');
    }
    grouped.push(c);
  }
  let sign = if amount < 0 { "-" } else { "" };
  match currency.to_ascii_uppercase().as_str() {
    "INR" => format!("{}₹{}", sign, grouped),
    "USD" => format!("{}${}", sign, grouped),
    "EUR" => format!("{}€{}", sign, grouped),
    other => format!("{}{} {}", sign, other, grouped),
  }
}

fn items_table(items: &[LineItem], currency: &str) -> String {
  let mut rows = String::new();
  for item in items {
    // Writing to a String cannot fail.
    let _ = write!(
      rows,
      "<tr><td>{}</td><td style=\"text-align:center\">{}</td><td style=\"text-align:right\">{}</td></tr>",
      escape_html(&item.name),
      item.quantity,
      item
        .line_total()
        .map(|total| format_amount(total, currency))
        .unwrap_or_else(|| "-".to_string())
    );
  }
  format!(
    "<table style=\"width:100%;border-collapse:collapse\">\
     <thead><tr><th align=\"left\">Item</th><th>Qty</th><th align=\"right\">Price</th></tr></thead>\
     <tbody>{}</tbody></table>",
    rows
  )
}

fn delivery_block(delivery: Option<&DeliveryDetails>) -> String {
  let Some(d) = delivery else {
    return String::new();
  };
  let mut lines = Vec::new();
  if let Some(name) = &d.recipient_name {
    lines.push(format!("<strong>Recipient:</strong> {}", escape_html(name)));
  }
  let address: Vec<&str> = [&d.address, &d.city, &d.pincode]
    .into_iter()
    .filter_map(|part| part.as_deref())
    .filter(|part| !part.trim().is_empty())
    .collect();
  if !address.is_empty() {
    lines.push(format!("<strong>Address:</strong> {}", escape_html(&address.join(", "))));
  }
  if let Some(phone) = &d.phone {
    lines.push(format!("<strong>Phone:</strong> {}", escape_html(phone)));
  }
  match (&d.date, &d.time_slot) {
    (Some(date), Some(slot)) => lines.push(format!(
      "<strong>Delivery:</strong> {} ({})",
      escape_html(date),
      escape_html(slot)
    )),
    (Some(date), None) => lines.push(format!("<strong>Delivery:</strong> {}", escape_html(date))),
    _ => {}
  }
  if lines.is_empty() {
    return String::new();
  }
  format!("<h3>Delivery details</h3><p>{}</p>", lines.join("<br>"))
}

fn wrap(title: &str, body: &str) -> String {
  format!(
    "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{}</title></head>\
     <body style=\"font-family:Arial,sans-serif;color:#333;max-width:600px;margin:0 auto\">{}\
     <p style=\"color:#888;font-size:12px\">PetalCart</p></body></html>",
    escape_html(title),
    body
  )
}

pub fn order_confirmation(order: &OrderNotification) -> RenderedEmail {
  let currency = order.currency();
  let subject = format!("Order Confirmation - {}", order.order_id);
  let body = format!(
    "<h2>Thank you for your order, {}!</h2>\
     <p>We have received your order <strong>{}</strong> and our florists are on it.</p>\
     {}<p><strong>Total: {}</strong></p>{}",
    escape_html(order.customer_name()),
    escape_html(&order.order_id),
    items_table(&order.items, currency),
    format_amount(order.total, currency),
    delivery_block(order.delivery.as_ref())
  );
  RenderedEmail {
    html: wrap(&subject, &body),
    subject,
  }
}

pub fn admin_order_alert(order: &OrderNotification) -> RenderedEmail {
  let currency = order.currency();
  let subject = format!("New Order Received - {}", order.order_id);
  let phone = order.customer.phone.as_deref().unwrap_or("not provided");
  let body = format!(
    "<h2>New order {}</h2>\
     <p><strong>Customer:</strong> {}<br><strong>Email:</strong> {}<br><strong>Phone:</strong> {}</p>\
     {}<p><strong>Total: {}</strong></p>{}",
    escape_html(&order.order_id),
    escape_html(order.customer_name()),
    escape_html(&order.customer.email),
    escape_html(phone),
    items_table(&order.items, currency),
    format_amount(order.total, currency),
    delivery_block(order.delivery.as_ref())
  );
  RenderedEmail {
    html: wrap(&subject, &body),
    subject,
  }
}

pub fn test_email() -> RenderedEmail {
  let subject = "PetalCart test email".to_string();
  let body = format!(
    "<h2>It works.</h2><p>This message was sent by the admin CLI at {}.</p>",
    chrono::Utc::now().to_rfc3339()
  );
  RenderedEmail {
    html: wrap(&subject, &body),
    subject,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::CustomerContact;

  fn notification() -> OrderNotification {
    OrderNotification {
      order_id: "order_abc".to_string(),
      customer: CustomerContact {
        name: Some("<Asha>".to_string()),
        email: "asha@example.com".to_string(),
        phone: Some("+91 98765 43210".to_string()),
      },
      items: vec![
        LineItem {
          name: "Mixed Roses & Lilies".to_string(),
          quantity: 2,
          price: 750,
        },
        LineItem {
          name: "Greeting card".to_string(),
          quantity: 1,
          price: 100,
        },
      ],
      total: 1600,
      currency: Some("INR".to_string()),
      delivery: Some(DeliveryDetails {
        address: Some("12 MG Road".to_string()),
        city: Some("Pune".to_string()),
        date: Some("2026-02-14".to_string()),
        time_slot: Some("Morning".to_string()),
        ..Default::default()
      }),
    }
  }

  #[test]
  fn escapes_markup() {
    assert_eq!(escape_html("<b>\"Tom\" & 'Jerry'</b>"), "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;");
  }

  #[test]
  fn amounts_are_grouped() {
    assert_eq!(format_amount(1500, "INR"), "₹1,500");
    assert_eq!(format_amount(999, "usd"), "$999");
    assert_eq!(format_amount(1234567, "GBP"), "GBP 1,234,567");
    assert_eq!(format_amount(-20, "EUR"), "-€20");
  }

  #[test]
  fn confirmation_lists_items_and_escapes_customer_input() {
    let email = order_confirmation(&notification());
    assert_eq!(email.subject, "Order Confirmation - order_abc");
    assert!(email.html.contains("&lt;Asha&gt;"));
    assert!(!email.html.contains("<Asha>"));
    assert!(email.html.contains("Mixed Roses &amp; Lilies"));
    assert!(email.html.contains("₹1,500"));
    assert!(email.html.contains("₹1,600"));
    assert!(email.html.contains("12 MG Road, Pune"));
    assert!(email.html.contains("2026-02-14 (Morning)"));
  }

  #[test]
  fn admin_alert_carries_contact_details() {
    let email = admin_order_alert(&notification());
    assert_eq!(email.subject, "New Order Received - order_abc");
    assert!(email.html.contains("asha@example.com"));
    assert!(email.html.contains("+91 98765 43210"));
  }

  #[test]
  fn missing_delivery_renders_nothing() {
    let mut order = notification();
    order.delivery = None;
    assert!(!order_confirmation(&order).html.contains("Delivery details"));
  }
}
