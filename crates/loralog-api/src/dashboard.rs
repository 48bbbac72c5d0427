use std::time::Duration;

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>loralog</title>
<style>
  body { font-family: sans-serif; margin: 2rem; }
  table { border-collapse: collapse; width: 100%; }
  th, td { border-bottom: 1px solid #ddd; padding: 0.4rem; text-align: left; }
  td.ts { white-space: nowrap; color: #555; }
  #status { color: #a00; }
</style>
</head>
<body>
<h1>LoRa messages</h1>
<p id="status"></p>
<table>
  <thead><tr><th>#</th><th>Time</th><th>Message</th></tr></thead>
  <tbody id="rows"></tbody>
</table>
<script>
const REFRESH_MS = {{REFRESH_MS}};

function cell(text, cls) {
  const td = document.createElement("td");
  td.textContent = text;
  if (cls) td.className = cls;
  return td;
}

async function refresh() {
  const status = document.getElementById("status");
  try {
    const res = await fetch("/api/messages");
    const body = await res.json();
    status.textContent = body.error ? "query failed: " + body.error : "";
    const rows = document.getElementById("rows");
    rows.replaceChildren(...body.messages.map((m) => {
      const tr = document.createElement("tr");
      tr.append(cell(m.id), cell(m.timestamp, "ts"), cell(m.message));
      return tr;
    }));
  } catch (err) {
    status.textContent = "unreachable: " + err;
  }
}

refresh();
setInterval(refresh, REFRESH_MS);
</script>
</body>
</html>
"#;

/// Dashboard page polling the message API every `refresh`.
pub(crate) fn render(refresh: Duration) -> String {
    let millis = refresh.as_millis().max(1000);
    TEMPLATE.replace("{{REFRESH_MS}}", &millis.to_string())
}
