//! Single-page front end. Renders the JSON from `/api/analysis` with Plotly.

pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Stock Tracer</title>
<meta name="viewport" content="width=device-width, initial-scale=1">
<script src="https://cdn.plot.ly/plotly-2.35.2.min.js"></script>
<style>
  body { font-family: system-ui, sans-serif; margin: 0; display: flex; }
  aside { width: 240px; padding: 1rem; background: #f4f4f6; min-height: 100vh; box-sizing: border-box; }
  main { flex: 1; padding: 1rem 2rem; overflow-x: auto; }
  label { display: block; margin-top: 0.8rem; font-size: 0.9rem; }
  input, select, button { width: 100%; box-sizing: border-box; margin-top: 0.2rem; padding: 0.3rem; }
  button { margin-top: 1rem; }
  table { border-collapse: collapse; font-size: 0.85rem; }
  th, td { border: 1px solid #ddd; padding: 0.25rem 0.5rem; text-align: right; }
  th:first-child, td:first-child { text-align: left; }
  .error { color: #b00020; }
  .warning { color: #8a6d00; }
  .note { color: #555; font-style: italic; }
</style>
</head>
<body>
<aside>
  <h3>Input Parameters</h3>
  <form id="params">
    <label>Stock Ticker <input name="ticker" value="AAPL"></label>
    <label>Day of the Week
      <select name="day">
        <option>Monday</option><option>Tuesday</option><option>Wednesday</option>
        <option>Thursday</option><option selected>Friday</option>
        <option>Saturday</option><option>Sunday</option>
      </select>
    </label>
    <label>Start Date <input type="date" name="start" min="2000-01-01"></label>
    <label>End Date <input type="date" name="end" min="2000-01-01"></label>
    <label>Indicator Basis
      <select name="basis"><option value="filtered">Weekday rows</option><option value="daily">Daily bars</option></select>
    </label>
    <button type="submit">Analyse</button>
  </form>
  <p><a id="csv" href="#">Download CSV</a></p>
</aside>
<main>
  <h1>Stock Performance Analysis</h1>
  <div id="status"></div>
  <div id="result" hidden>
    <h2 id="heading"></h2>
    <div id="table"></div>
    <div id="ohlc"></div>
    <div id="stochastic"></div>
    <div id="rsi"></div>
    <h3>Summary Statistics</h3>
    <ul id="summary"></ul>
    <h3>Analyst Insights</h3>
    <ul id="insights"></ul>
    <p id="insights-note" class="note"></p>
  </div>
</main>
<script>
const form = document.getElementById('params');
const today = new Date();
const iso = d => d.toISOString().slice(0, 10);
form.end.value = iso(today);
form.end.max = iso(today);
form.start.max = iso(today);
form.start.value = iso(new Date(today.getTime() - 52 * 7 * 86400000));

const fmt = v => (v === null || v === undefined) ? 'N/A' : Number(v).toFixed(2);
const columns = ['Date', 'Open', 'High', 'Low', 'Close', 'Volume', 'Variance', '%K', '%D', 'RSI'];

function bullets(el, text) {
  el.innerHTML = '';
  for (const line of text.split('\n')) {
    const li = document.createElement('li');
    li.textContent = line.replace(/^- /, '');
    el.appendChild(li);
  }
}

function renderTable(rows) {
  const head = '<tr>' + columns.map(c => `<th>${c}</th>`).join('') + '</tr>';
  const body = rows.map(r => '<tr>' + columns.map(c => {
    const v = r[c];
    if (c === 'Date') return `<td>${v}</td>`;
    if (c === 'Volume') return `<td>${v}</td>`;
    return `<td>${fmt(v)}</td>`;
  }).join('') + '</tr>').join('');
  document.getElementById('table').innerHTML = `<table>${head}${body}</table>`;
}

function lineChart(id, chart) {
  const traces = chart.traces.map(t => ({
    x: chart.dates, y: t.values, name: t.name, mode: 'lines', line: { color: t.color }
  }));
  const shapes = chart.guides.map(g => ({
    type: 'line', xref: 'paper', x0: 0, x1: 1, y0: g.value, y1: g.value,
    line: { color: g.color, dash: 'dash' }
  }));
  const annotations = chart.guides.map(g => ({
    xref: 'paper', x: 1, y: g.value, text: g.label, showarrow: false, xanchor: 'right'
  }));
  Plotly.newPlot(id, traces, {
    title: chart.title, height: chart.height, shapes, annotations,
    xaxis: { title: chart.x_title }, yaxis: { title: chart.y_title }
  });
}

function render(report) {
  document.getElementById('heading').textContent = report.heading;
  renderTable(report.table);
  const o = report.charts.ohlc;
  Plotly.newPlot('ohlc', [{
    type: 'candlestick', x: o.dates, open: o.open, high: o.high, low: o.low, close: o.close, name: o.name
  }], { title: o.title, height: o.height, xaxis: { title: o.x_title, rangeslider: { visible: false } }, yaxis: { title: o.y_title } });
  lineChart('stochastic', report.charts.stochastic);
  lineChart('rsi', report.charts.rsi);
  bullets(document.getElementById('summary'), report.summary_text);
  bullets(document.getElementById('insights'), report.insights.text);
  document.getElementById('insights-note').textContent = report.insights.note || '';
  document.getElementById('result').hidden = false;
}

async function analyse(event) {
  if (event) event.preventDefault();
  const params = new URLSearchParams(new FormData(form));
  const status = document.getElementById('status');
  document.getElementById('csv').href = '/api/analysis.csv?' + params;
  status.textContent = 'Loading...';
  status.className = '';
  try {
    const response = await fetch('/api/analysis?' + params);
    const body = await response.json();
    if (!response.ok) {
      document.getElementById('result').hidden = true;
      status.textContent = body.message;
      status.className = body.error === 'no_weekday_data' ? 'warning' : 'error';
      return;
    }
    status.textContent = '';
    render(body);
  } catch (err) {
    status.textContent = 'Request failed: ' + err;
    status.className = 'error';
  }
}

form.addEventListener('submit', analyse);
analyse();
</script>
</body>
</html>
"##;
