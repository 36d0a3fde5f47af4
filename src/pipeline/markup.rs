//! Template substitution: [`Batch`] → HTML [`Markup`].
//!
//! Rendering the markup is a pure function of the batch and the layout: no
//! I/O, no clock, no randomness. The same input always produces byte-identical
//! markup, which keeps the PDF stage the only place anything can go wrong.
//!
//! Every receipt becomes one `<section class="receipt">` sized to a single A4
//! page (after the 10 mm page margin), and every section after the first
//! forces a page break, so the engine emits exactly one page per record.

use crate::config::ReceiptLayout;
use crate::record::{Batch, DisplayRecord};
use std::fmt::Write;

/// Marker the markup carries once per receipt section.
pub const RECEIPT_SECTION_MARKER: &str = "<section class=\"receipt\">";

/// A complete HTML document ready for the render engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markup(String);

impl Markup {
    /// Wrap pre-built HTML, bypassing the receipt template.
    pub fn from_html(html: impl Into<String>) -> Self {
        Self(html.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Number of receipt sections, one per expected output page.
    pub fn receipt_count(&self) -> usize {
        self.0.matches(RECEIPT_SECTION_MARKER).count()
    }
}

impl AsRef<str> for Markup {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

const STYLE: &str = r#"
    body { font-family: sans-serif; margin: 0; }
    @page { size: A4; margin: 10mm; }
    .receipt {
        position: relative;
        box-sizing: border-box;
        width: 190mm;
        height: 276mm;
        overflow: hidden;
        border: 2px solid #ccc;
        page-break-inside: avoid;
    }
    .receipt + .receipt { page-break-before: always; }
    .header { text-align: center; margin-bottom: 2px; }
    .header h2 { margin: 6px 0; }
    .details { margin: 0 6mm 1px 6mm; }
    .amount-words { font-style: italic; }
    .signature-area, .offices { width: 100%; border-collapse: collapse; margin-top: 20px; }
    .signature-area td { border: 1px solid #ccc; padding: 5px; text-align: left; }
    .offices td { border: 1px solid black; padding: 5px; text-align: left; word-wrap: break-word; }
    .input-field { border-bottom: 1px dotted #ccc; padding: 3px; display: inline-block; }
    .seal-container { position: absolute; left: 10mm; bottom: 10mm; width: 40mm; height: 25mm; }
    .seal { text-align: center; color: blue; }
    .bottom-left-box {
        position: absolute; bottom: 40mm; left: 30mm;
        width: 120mm; height: 55mm;
        border: 2px solid blue; padding: 10px;
        color: blue; text-align: left;
    }
    .bottom-left-box p { margin: 3px 0; }
"#;

/// Render the whole batch into one HTML document.
pub fn render_markup(batch: &Batch, layout: &ReceiptLayout) -> Markup {
    let mut html = String::with_capacity(4096 * batch.len());
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"UTF-8\">\n");
    html.push_str("<title>Hand Receipt (RPWA 28)</title>\n");
    let _ = write!(html, "<style>{STYLE}</style>\n</head>\n<body>\n");

    for record in batch {
        push_receipt(&mut html, record, layout);
    }

    html.push_str("</body>\n</html>\n");
    Markup(html)
}

fn push_receipt(html: &mut String, r: &DisplayRecord, layout: &ReceiptLayout) {
    let payee = escape_html(&r.payee);
    let amount = escape_html(&r.amount_formatted);
    let words = escape_html(&r.amount_words);
    let work = escape_html(&r.work);
    let designation = escape_html(&layout.payee_designation);
    let division = escape_html(&layout.division);
    let officer = escape_html(&layout.disbursing_officer);
    let head = escape_html(&layout.chargeable_head);
    let gap = "&nbsp;".repeat(5);
    let wide_gap = "&nbsp;".repeat(12);

    // Writing into a String cannot fail.
    let _ = write!(
        html,
        r#"{RECEIPT_SECTION_MARKER}
  <div class="header">
    <h2>Payable to: - {payee} ( {designation})</h2>
    <h2>HAND RECEIPT (RPWA 28)</h2>
    <p>(Referred to in PWF&amp;A Rules 418,424,436 &amp; 438)</p>
    <p>Division - {division}</p>
  </div>
  <div class="details">
    <p>(1)Cash Book Voucher No. {gap} Date {gap}</p>
    <p>(2)Cheque No. and Date {gap}</p>
    <p>(3) Pay for ECS Rs.{amount}/- (Rupees <span class="amount-words">{words} Only</span>)</p>
    <p>(4) Paid by me</p>
    <p>(5) Received from {officer} the sum of Rs. {amount}/- (Rupees <span class="amount-words">{words} Only</span>)</p>
    <p> Name of work for which payment is made: <span class="input-field">{work}</span></p>
    <p> Chargeable to Head:- {head} </p>
    <table class="signature-area">
      <tr><td>Witness</td><td>Stamp</td><td>Signature of payee</td></tr>
      <tr><td>Cash Book No. {wide_gap} Page No. {gap}</td><td></td><td></td></tr>
    </table>
    <table class="offices">
      <tr><td>For use in the Divisional Office</td><td>For use in the Accountant General's office</td></tr>
      <tr><td>Checked</td><td>Audited/Reviewed</td></tr>
      <tr><td>Accounts Clerk</td><td>DA {wide_gap} Auditor {wide_gap} Supdt. {wide_gap} G.O.</td></tr>
    </table>
  </div>
  <div class="seal-container"><div class="seal"></div></div>
  <div class="bottom-left-box">
    <p> Passed for Rs. {amount}</p>
    <p> In Words Rupees: {words} Only</p>
    <p> Chargeable to Head:- {head}</p>
    <div class="seal"><p>Ar.{wide_gap}{wide_gap}D.A.{wide_gap}{wide_gap}E.E.</p></div>
  </div>
</section>
"#
    );
}

/// Escape text for use in HTML element content and attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
