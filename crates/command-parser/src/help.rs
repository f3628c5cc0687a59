use taxy_core_types::Locale;

const HELP_EN: &str = "\
Available commands:
  /taxy click <selector|text>          click an element
  /taxy type <selector> <text>         type into a field (or: type \"text\" in \"selector\")
  /taxy navigate <url>                 open a page (alias: goto)
  /taxy scroll top|bottom|x,y          scroll the page
  /taxy scroll up|down|left|right [n]  scroll by n pixels (default 300)
  /taxy scroll to <selector>           scroll an element into view
  /taxy drag <source> to <target>      drag one element onto another
  /taxy wait <ms>                      pause
  /taxy screenshot [selector]          capture the page or one element
  /taxy test <selector>                highlight matching elements
  /taxy automate <instruction>         plan and run several steps
  /taxy help                           show this text
Arguments may be wrapped in [brackets], \"quotes\" or given as a JSON object.";

const HELP_PL: &str = "\
Dostępne polecenia (prefiks /taksówka lub /taxy):
  /taksówka click <selektor|tekst>          kliknij element
  /taksówka type <selektor> <tekst>         wpisz tekst (lub: type \"tekst\" in \"selektor\")
  /taksówka navigate <url>                  otwórz stronę (alias: goto)
  /taksówka scroll top|bottom|x,y           przewiń stronę
  /taksówka scroll up|down|left|right [n]   przewiń o n pikseli (domyślnie 300)
  /taksówka scroll to <selektor>            przewiń do elementu
  /taksówka drag <źródło> to <cel>          przeciągnij element
  /taksówka wait <ms>                       odczekaj
  /taksówka screenshot [selektor]           zrób zrzut strony lub elementu
  /taksówka test <selektor>                 podświetl pasujące elementy
  /taksówka automate <instrukcja>           zaplanuj i wykonaj kilka kroków
  /taksówka help                            pokaż tę pomoc
Argumenty można podać w [nawiasach], \"cudzysłowach\" lub jako obiekt JSON.";

pub fn help_text(locale: Locale) -> &'static str {
    match locale {
        Locale::En => HELP_EN,
        Locale::Pl => HELP_PL,
    }
}
