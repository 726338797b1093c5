use crate::models::{MAX_SCORE, TOTAL_DAYS};

pub fn render_index() -> String {
    INDEX_HTML
        .replace("{{TOTAL_DAYS}}", &TOTAL_DAYS.to_string())
        .replace("{{MAX_SCORE}}", &MAX_SCORE.to_string())
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>100 Days Challenge</title>
  <style>
    @import url('https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&family=Fraunces:wght@600&display=swap');

    :root {
      --bg-1: #eef6ee;
      --bg-2: #c9ecd3;
      --ink: #1f2a24;
      --accent: #22a55a;
      --accent-2: #2f4858;
      --card: rgba(255, 255, 255, 0.88);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
      --three: #22c55e;
      --two: #eab308;
      --one: #f97316;
      --missed: #ef4444;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
        linear-gradient(135deg, var(--bg-1), #e4f5e9 60%, #f4faf5 100%);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(900px, 100%);
      background: var(--card);
      backdrop-filter: blur(12px);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 36px;
      display: grid;
      gap: 24px;
    }

    header {
      display: flex;
      flex-wrap: wrap;
      justify-content: space-between;
      align-items: center;
      gap: 12px;
    }

    h1 {
      font-family: "Fraunces", "Georgia", serif;
      font-weight: 600;
      font-size: clamp(2rem, 4vw, 2.8rem);
      margin: 0;
    }

    .panel {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(160px, 1fr));
      gap: 16px;
    }

    .stat {
      background: white;
      border-radius: 18px;
      padding: 16px;
      border: 1px solid rgba(47, 72, 88, 0.08);
      display: grid;
      gap: 6px;
    }

    .stat .label {
      font-size: 0.8rem;
      text-transform: uppercase;
      letter-spacing: 0.12em;
      color: #7d857f;
    }

    .stat .value {
      font-size: 1.5rem;
      font-weight: 600;
      color: var(--accent-2);
    }

    .grid {
      display: grid;
      grid-template-columns: repeat(10, 1fr);
      gap: 8px;
    }

    .day {
      aspect-ratio: 1;
      border-radius: 12px;
      border: 1px solid rgba(47, 72, 88, 0.1);
      background: rgba(47, 72, 88, 0.05);
      display: grid;
      place-items: center;
      font-weight: 600;
      color: #8b938d;
      opacity: 0.6;
      cursor: not-allowed;
      position: relative;
    }

    .day.current {
      background: white;
      border: 2px solid var(--accent);
      color: var(--ink);
    }

    .day.clickable {
      opacity: 1;
      cursor: pointer;
      box-shadow: 0 8px 18px rgba(34, 165, 90, 0.25);
    }

    .day.tasks-3 { background: rgba(34, 197, 94, 0.18); color: #15803d; }
    .day.tasks-2 { background: rgba(234, 179, 8, 0.18); color: #a16207; }
    .day.tasks-1 { background: rgba(249, 115, 22, 0.18); color: #c2410c; }
    .day.missed { background: rgba(239, 68, 68, 0.12); color: #b91c1c; }

    .day[data-sync="pending"]::after,
    .day[data-sync="failed"]::after {
      content: '';
      position: absolute;
      top: 6px;
      right: 6px;
      width: 6px;
      height: 6px;
      border-radius: 50%;
      background: #9ca3af;
    }

    .day[data-sync="failed"]::after {
      background: var(--missed);
    }

    button {
      appearance: none;
      border: none;
      border-radius: 999px;
      padding: 12px 18px;
      font-size: 0.95rem;
      font-weight: 600;
      cursor: pointer;
      background: var(--accent-2);
      color: white;
    }

    button.primary {
      background: var(--accent);
    }

    input[type="text"] {
      border-radius: 999px;
      border: 1px solid rgba(47, 72, 88, 0.2);
      padding: 10px 14px;
      font: inherit;
    }

    .auth {
      display: flex;
      gap: 8px;
      align-items: center;
    }

    dialog {
      border: none;
      border-radius: 20px;
      padding: 24px;
      width: min(420px, 92vw);
      box-shadow: var(--shadow);
    }

    .task {
      display: flex;
      justify-content: space-between;
      align-items: center;
      padding: 14px;
      border-radius: 12px;
      background: rgba(47, 72, 88, 0.05);
      margin-bottom: 10px;
      cursor: pointer;
    }

    .dialog-actions {
      display: flex;
      gap: 10px;
      justify-content: flex-end;
    }

    .legend {
      display: flex;
      flex-wrap: wrap;
      gap: 14px;
      font-size: 0.85rem;
      color: #6b736d;
    }

    .legend span::before {
      content: '';
      display: inline-block;
      width: 10px;
      height: 10px;
      border-radius: 50%;
      margin-right: 6px;
      background: var(--dot);
    }

    .status {
      font-size: 0.95rem;
      color: #6b645d;
      min-height: 1.2em;
    }

    .status[data-type="error"] {
      color: #c63b2b;
    }

    @media (max-width: 600px) {
      .app {
        padding: 24px 16px;
      }
      .grid {
        grid-template-columns: repeat(5, 1fr);
      }
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>100 Days Challenge</h1>
      <div class="auth">
        <span id="who">Local</span>
        <input id="user-id" type="text" placeholder="user id" />
        <button id="sign-in" type="button">Sign in</button>
        <button id="sign-out" type="button" hidden>Sign out</button>
      </div>
    </header>

    <section class="panel">
      <div class="stat">
        <span class="label">Days left</span>
        <span id="days-left" class="value">{{TOTAL_DAYS}}</span>
      </div>
      <div class="stat">
        <span class="label">Score</span>
        <span class="value"><span id="score">0</span> / {{MAX_SCORE}}</span>
      </div>
      <div class="stat">
        <span class="label">Ends</span>
        <span id="end-date" class="value">--</span>
      </div>
    </section>

    <section id="grid" class="grid" aria-label="Challenge days"></section>

    <div class="legend">
      <span style="--dot: var(--three)">3 tasks</span>
      <span style="--dot: var(--two)">2 tasks</span>
      <span style="--dot: var(--one)">1 task</span>
      <span style="--dot: var(--missed)">Missed</span>
    </div>

    <div class="status" id="status"></div>
  </main>

  <dialog id="task-dialog">
    <h2 id="dialog-title">Day</h2>
    <p>Review your goals for today</p>
    <label class="task"><span>Exercise</span><input type="checkbox" data-task="exercise" /></label>
    <label class="task"><span>Programming</span><input type="checkbox" data-task="programming" /></label>
    <label class="task"><span>Healthy Food</span><input type="checkbox" data-task="healthyFood" /></label>
    <div class="dialog-actions">
      <button id="cancel" type="button">Cancel</button>
      <button id="save" class="primary" type="button">Save Progress</button>
    </div>
  </dialog>

  <script>
    const gridEl = document.getElementById('grid');
    const statusEl = document.getElementById('status');
    const dialogEl = document.getElementById('task-dialog');
    const whoEl = document.getElementById('who');
    const userInput = document.getElementById('user-id');
    const signInBtn = document.getElementById('sign-in');
    const signOutBtn = document.getElementById('sign-out');
    const checkboxes = Array.from(dialogEl.querySelectorAll('input[data-task]'));

    const setStatus = (message, type) => {
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
    };

    const authHeaders = () => {
      const token = localStorage.getItem('accessToken');
      return token ? { authorization: `Bearer ${token}` } : {};
    };

    const request = async (method, path, body) => {
      const headers = { ...authHeaders() };
      if (body !== undefined) {
        headers['content-type'] = 'application/json';
      }
      const res = await fetch(path, {
        method,
        headers,
        body: body === undefined ? undefined : JSON.stringify(body)
      });
      if (res.status === 401) {
        localStorage.removeItem('accessToken');
      }
      if (!res.ok) {
        const msg = await res.text();
        throw new Error(msg || 'Request failed');
      }
      return res.status === 204 ? null : res.json();
    };

    const render = (view) => {
      document.getElementById('days-left').textContent = Math.max(0, view.days_left);
      document.getElementById('score').textContent = view.score;
      document.getElementById('end-date').textContent = view.end_date || '--';

      gridEl.innerHTML = '';
      view.days.forEach((day, index) => {
        const cell = document.createElement('div');
        cell.className = `day ${day.status}`;
        if (day.completed_tasks > 0 && day.status !== 'missed') {
          cell.classList.add(`tasks-${day.completed_tasks}`);
        }
        if (day.clickable) {
          cell.classList.add('clickable');
          cell.addEventListener('click', () => openDay(index).catch((err) => setStatus(err.message, 'error')));
        }
        cell.dataset.sync = day.sync;
        cell.title = day.date;
        cell.textContent = day.day;
        gridEl.appendChild(cell);
      });

      if (view.dialog.open) {
        document.getElementById('dialog-title').textContent = `Day ${view.dialog.day}`;
        checkboxes.forEach((box) => {
          box.checked = Boolean(view.dialog.tasks[box.dataset.task]);
        });
        if (!dialogEl.open) {
          dialogEl.showModal();
        }
      } else if (dialogEl.open) {
        dialogEl.close();
      }
    };

    const refreshIdentity = async () => {
      const me = await request('GET', '/api/auth/me');
      const signedIn = Boolean(me.user_id);
      whoEl.textContent = signedIn ? me.user_id : 'Local';
      userInput.hidden = signedIn;
      signInBtn.hidden = signedIn;
      signOutBtn.hidden = !signedIn;
    };

    const load = async () => {
      await refreshIdentity();
      render(await request('GET', '/api/challenge'));
    };

    const openDay = async (index) => {
      render(await request('POST', `/api/days/${index}/open`));
    };

    document.getElementById('save').addEventListener('click', async () => {
      const tasks = {};
      checkboxes.forEach((box) => {
        tasks[box.dataset.task] = box.checked;
      });
      try {
        render(await request('POST', '/api/dialog/save', tasks));
        setStatus('', '');
      } catch (err) {
        setStatus(err.message, 'error');
      }
    });

    document.getElementById('cancel').addEventListener('click', () => {
      request('POST', '/api/dialog/close').then(render).catch((err) => setStatus(err.message, 'error'));
    });

    signInBtn.addEventListener('click', async () => {
      try {
        const grant = await request('POST', '/api/auth/sign-in', { user_id: userInput.value });
        localStorage.setItem('accessToken', grant.token);
        await load();
      } catch (err) {
        setStatus(err.message, 'error');
      }
    });

    signOutBtn.addEventListener('click', async () => {
      try {
        await request('POST', '/api/auth/sign-out');
      } catch (err) {
        setStatus(err.message, 'error');
      }
      localStorage.removeItem('accessToken');
      await load();
    });

    load().catch((err) => setStatus(err.message, 'error'));
  </script>
</body>
</html>
"#;
