use runeline::prelude::*;
use std::io::Write;
use std::thread;
use std::time::Duration;

fn completer() -> PrefixCompleter {
    PrefixCompleter::new(vec![
        PrefixCompleter::item(
            "mode",
            vec![PrefixCompleter::leaf("vi"), PrefixCompleter::leaf("emacs")],
        ),
        PrefixCompleter::leaf("login"),
        PrefixCompleter::item("setprompt", vec![PrefixCompleter::leaf("~> ")]),
        PrefixCompleter::leaf("sayhello"),
        PrefixCompleter::leaf("help"),
        PrefixCompleter::leaf("bye"),
    ])
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let rl = Readline::builder()
        .with_prompt("\x1b[31m»\x1b[0m ")
        .with_history_file(std::env::temp_dir().join("runeline-demo.history"))
        .with_auto_complete(completer())
        .with_mask_rune('*')
        .build()?;

    loop {
        let line = match rl.readline() {
            Ok(line) => line,
            Err(ReadlineError::Interrupt) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        };

        let line = line.trim();
        match line {
            "mode vi" => rl.set_vim_mode(true),
            "mode emacs" => rl.set_vim_mode(false),
            "mode" => {
                let mode = if rl.is_vim_mode() { "vi" } else { "emacs" };
                println!("current mode: {mode}");
            }
            "login" => {
                let password = rl.read_password("please enter your password: ")?;
                println!("you entered {} characters", password.chars().count());
            }
            "sayhello" => {
                let mut out = rl.stdout();
                thread::spawn(move || {
                    for _ in 0..5 {
                        thread::sleep(Duration::from_secs(1));
                        let _ = writeln!(out, "hello");
                    }
                });
            }
            "help" => println!("commands: mode, login, setprompt, sayhello, bye"),
            "bye" => break,
            _ if line.starts_with("setprompt") => {
                let prompt = line["setprompt".len()..].trim_start();
                if prompt.is_empty() {
                    println!("usage: setprompt <prompt>");
                } else {
                    rl.set_prompt(prompt);
                }
            }
            "" => {}
            _ => println!("you said: {line:?}"),
        }
    }

    rl.close()?;
    Ok(())
}
