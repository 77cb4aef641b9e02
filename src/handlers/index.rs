use axum::response::Html;

/// `GET /` — the upload form. All rendering happens client-side from the
/// JSON report; the chart arrives as server-rendered SVG.
pub async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

const INDEX_HTML: &str = r##"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>AI Text Detector for PDFs</title>
<style>
  body { font-family: system-ui, sans-serif; margin: 0; display: flex; min-height: 100vh; }
  aside { width: 280px; padding: 1.5rem; background: #f3f4f6; }
  main { flex: 1; padding: 1.5rem 2.5rem; max-width: 900px; }
  .metric { font-size: 2.4rem; font-weight: 600; }
  .band { padding: .6rem 1rem; border-left: 6px solid; margin: 1rem 0; }
  .chart { max-width: 420px; }
  .error { color: #b91c1c; }
  details { margin: .8rem 0; border: 1px solid #e5e7eb; border-radius: 6px; padding: .5rem 1rem; }
  pre { white-space: pre-wrap; max-height: 300px; overflow: auto; }
</style>
</head>
<body>
<aside>
  <h3>Upload a PDF</h3>
  <form id="upload">
    <input type="file" name="file" accept="application/pdf" required>
    <p><button type="submit">Analyze</button></p>
  </form>
  <p id="status"></p>
</aside>
<main>
  <h1>AI-generated text detector</h1>
  <div id="welcome">Upload a PDF from the side panel to start.</div>
  <div id="result" hidden>
    <h2>Analysis result</h2>
    <div>AI probability</div>
    <div class="metric" id="metric"></div>
    <div class="chart" id="chart"></div>
    <h2>Interpretation</h2>
    <div class="band" id="band"></div>
    <details><summary>Automatic summary</summary><p id="summary"></p></details>
    <details><summary>Key figures</summary><p id="numbers"></p></details>
    <details><summary>Analyzed text preview</summary><pre id="preview"></pre></details>
  </div>
</main>
<script>
const form = document.getElementById('upload');
const status = document.getElementById('status');
form.addEventListener('submit', async (event) => {
  event.preventDefault();
  status.className = '';
  status.textContent = 'Extracting and analyzing...';
  document.getElementById('result').hidden = true;
  try {
    const response = await fetch('/api/v1/analyze', { method: 'POST', body: new FormData(form) });
    const payload = await response.json();
    if (!payload.success) {
      status.className = 'error';
      status.textContent = payload.error.message;
      return;
    }
    const data = payload.data;
    status.textContent = 'File analyzed.';
    document.getElementById('welcome').hidden = true;
    document.getElementById('metric').textContent = data.ai_percentage;
    document.getElementById('chart').innerHTML = data.chart.svg;
    const band = document.getElementById('band');
    band.style.borderColor = data.band.color;
    band.textContent = data.band.label + ': ' + data.band.description;
    document.getElementById('summary').textContent = data.summary;
    document.getElementById('numbers').textContent = data.numbers_display;
    document.getElementById('preview').textContent = data.text_preview;
    document.getElementById('result').hidden = false;
  } catch (err) {
    status.className = 'error';
    status.textContent = 'Request failed: ' + err;
  }
});
</script>
</body>
</html>
"##;
