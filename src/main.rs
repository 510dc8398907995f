use cxbench::error::AppResult;

fn main() -> AppResult<()> {
    cxbench::entry::run()
}
