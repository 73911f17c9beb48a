mod fake_venue;
mod supervisor_cycle;
