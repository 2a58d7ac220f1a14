// heaplens: type-driven memory footprint engine with TUI visualization

use std::io;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use heaplens::engine::config::SizeConfig;
use heaplens::engine::sizer::Sizer;
use heaplens::report;
use heaplens::runtime::heap::{ObjRef, ObjectHeap};
use heaplens::runtime::object::{ClassDef, CodeDef, Object};
use heaplens::track::Tracker;
use heaplens::ui::App;

fn usage(program_name: &str) {
    eprintln!("Usage: {} [--report] [--code] [--cutoff N]", program_name);
    eprintln!();
    eprintln!("Sizes a demonstration object graph and shows the result.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --report     print the text report instead of opening the TUI");
    eprintln!("  --code       include code objects (functions, classes) in totals");
    eprintln!("  --cutoff N   collapse profile rows below N percent of the total");
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let program_name = args.first().map(|s| s.as_str()).unwrap_or("heaplens");

    let mut report_mode = false;
    let mut code = false;
    let mut cutoff = 0.0_f64;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--report" => report_mode = true,
            "--code" => code = true,
            "--cutoff" => {
                i += 1;
                cutoff = match args.get(i).and_then(|v| v.parse().ok()) {
                    Some(v) => v,
                    None => {
                        eprintln!("Error: --cutoff needs a numeric argument");
                        usage(program_name);
                        std::process::exit(1);
                    }
                };
            }
            "--help" | "-h" => {
                usage(program_name);
                return Ok(());
            }
            other => {
                eprintln!("Error: unknown option '{}'", other);
                usage(program_name);
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let mut heap = ObjectHeap::new();
    let roots = build_demo_graph(&mut heap);

    let config = SizeConfig {
        code,
        cutoff,
        detail: 3,
        ..SizeConfig::default()
    };
    let mut sizer = match Sizer::new(&heap, config) {
        Ok(sizer) => sizer,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // History budget for the longitudinal tracker (1 MiB of snapshots)
    let mut tracker = Tracker::new(1024 * 1024);
    for (name, root) in &roots {
        tracker.track(name, *root);
    }

    if report_mode {
        tracker.record(&heap, &mut sizer)?;
        let root_refs: Vec<ObjRef> = roots.iter().map(|(_, r)| *r).collect();
        let records = sizer.detailed_of(&heap, &root_refs)?;
        println!("{}", report::summary(&sizer));
        println!();
        println!("{}", report::profile_table(&heap, &sizer));
        println!();
        for record in &records {
            print!("{}", report::record_tree(record));
        }
        println!();
        println!("{}", report::typedefs(&heap, sizer.registry()));
        return Ok(());
    }

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let root_refs: Vec<ObjRef> = roots.iter().map(|(_, r)| *r).collect();
    let app = App::new(heap, sizer, tracker, root_refs);
    let res = match app {
        Ok(mut app) => app.run(&mut terminal),
        Err(e) => {
            disable_raw_mode()?;
            execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

/// Build a demonstration graph: a user class with instances, shared and
/// cyclic containers, strings, a function with code, and an exception.
fn build_demo_graph(heap: &mut ObjectHeap) -> Vec<(String, ObjRef)> {
    let object = heap.builtins().object;

    // class demo.Point with two instances
    let doc = heap.alloc(Object::Str("A 2D point.".to_string()));
    let point_class = heap.alloc(Object::Class(ClassDef {
        name: "Point".to_string(),
        module: "demo".to_string(),
        bases: vec![object],
        attrs: vec![("doc".to_string(), doc)],
        slots: None,
        builtin: None,
    }));
    let mut points = Vec::new();
    for i in 0..4 {
        let x = heap.alloc(Object::Float(i as f64));
        let y = heap.alloc(Object::Float(i as f64 * 2.0));
        points.push(heap.alloc(Object::Instance {
            class: point_class,
            attrs: vec![("x".to_string(), x), ("y".to_string(), y)],
        }));
    }

    // a list of points, sharing one string across entries of a map
    let point_list = heap.alloc(Object::List(points.clone()));
    let shared = heap.alloc(Object::Str("shared label".to_string()));
    let mut pairs = Vec::new();
    for (i, &p) in points.iter().enumerate() {
        let key = heap.alloc(Object::Str(format!("p{}", i)));
        pairs.push((key, p));
    }
    let label_key = heap.alloc(Object::Str("label".to_string()));
    pairs.push((label_key, shared));
    let registry_map = heap.alloc(Object::Map(pairs));

    // a cycle: the list ends up containing the map which references it back
    let cycle_key = heap.alloc(Object::Str("all".to_string()));
    if let Some(Object::Map(pairs)) = heap.get_mut(registry_map) {
        pairs.push((cycle_key, point_list));
    }
    if let Some(Object::List(items)) = heap.get_mut(point_list) {
        items.push(registry_map);
    }

    // a function with a code object and defaults
    let default = heap.alloc(Object::Int(10));
    let const_str = heap.alloc(Object::Str("midpoint".to_string()));
    let code = heap.alloc(Object::Code(CodeDef {
        name: "midpoint".to_string(),
        stack_slots: 6,
        local_slots: 3,
        free_slots: 0,
        cell_slots: 1,
        consts: vec![const_str],
    }));
    let function = heap.alloc(Object::Function {
        name: "midpoint".to_string(),
        module: "demo".to_string(),
        code: Some(code),
        defaults: vec![default],
    });

    // a big string and an exception with a message
    let blob = heap.alloc(Object::Str("x".repeat(2048)));
    let message = heap.alloc(Object::Str("point out of range".to_string()));
    let error = heap.alloc(Object::Exception {
        message: Some(message),
        args: vec![blob],
        location: Some(("demo.rs".to_string(), 42)),
    });

    // the demo module ties it together
    let module = heap.alloc(Object::Module {
        name: "demo".to_string(),
        globals: vec![
            ("Point".to_string(), point_class),
            ("points".to_string(), point_list),
            ("registry".to_string(), registry_map),
            ("midpoint".to_string(), function),
            ("last_error".to_string(), error),
        ],
    });

    vec![
        ("demo".to_string(), module),
        ("points".to_string(), point_list),
        ("registry".to_string(), registry_map),
    ]
}
